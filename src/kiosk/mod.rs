//! Learner-side runner: feeds FunBox presses into a meeting session and
//! carries out the effects it asks for.

pub mod client;

use std::future::pending;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::meeting::{Effect, MeetingOutcome, MeetingSession, Step};
use crate::serial::{FunBoxHandle, SerialError};

pub use client::{ApiClient, HttpApiClient, NoopApiClient};

/// The student working at this kiosk, passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStudent {
    pub id: String,
    pub name: Option<String>,
}

impl ActiveStudent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingRun {
    /// Quiz done. `saved` is false when the progress submission failed.
    Finished { outcome: MeetingOutcome, saved: bool },
    /// The learner backed out to the meeting list.
    Exited,
}

pub async fn run_meeting(
    mut session: MeetingSession,
    funbox: &FunBoxHandle,
    api: &dyn ApiClient,
    student: &ActiveStudent,
) -> Result<MeetingRun, SerialError> {
    let mut presses = funbox.presses();
    let mut advance_at: Option<Instant> = None;
    let mut saved = false;
    let mut effects = session.start();

    loop {
        for effect in effects.drain(..) {
            match effect {
                Effect::Send(command) => {
                    if let Err(e) = funbox.send(command).await {
                        warn!("could not send {} to FunBox: {}", command, e);
                    }
                }
                Effect::Celebrate => info!("correct answer, celebrating"),
                Effect::ScheduleAdvance(delay) => advance_at = Some(Instant::now() + delay),
                Effect::Submit(progress) => {
                    match api.submit_progress(&student.id, &progress).await {
                        Ok(result) => {
                            saved = true;
                            info!("progress saved as result {}", result.id);
                        }
                        // The result screen is shown either way.
                        Err(e) => warn!("progress submission failed: {}", e),
                    }
                }
                Effect::Exit => return Ok(MeetingRun::Exited),
            }
        }

        match session.step() {
            Step::Result => {
                if let Some(outcome) = session.outcome() {
                    return Ok(MeetingRun::Finished { outcome, saved });
                }
            }
            Step::Exited => return Ok(MeetingRun::Exited),
            Step::Activity(index) => {
                if session.activity_progress().is_some_and(|p| p.needs_text()) {
                    info!("activity {} needs typed input, skipping", index);
                    effects = session.skip_activity();
                    continue;
                }
            }
            _ => {}
        }

        let advance = async move {
            match advance_at {
                Some(at) => sleep_until(at).await,
                None => pending().await,
            }
        };

        tokio::select! {
            _ = advance => {
                advance_at = None;
                effects = session.advance_after_feedback();
            }
            press = presses.recv() => match press {
                Ok(button) => effects = session.handle_button(button),
                Err(RecvError::Lagged(missed)) => {
                    warn!("missed {} button presses", missed);
                }
                Err(RecvError::Closed) => return Err(SerialError::Disconnected),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    use super::*;
    use crate::error::AppError;
    use crate::models::{Meeting, MeetingContent, Module, ProgressRequest, QuizQuestion, QuizResult};
    use crate::serial::FunBox;

    struct FailingApi;

    #[async_trait]
    impl ApiClient for FailingApi {
        async fn fetch_module(&self, _module_id: i64) -> Result<Module, AppError> {
            Err(AppError::InternalServerError)
        }

        async fn fetch_meeting(&self, _meeting_id: i64) -> Result<Meeting, AppError> {
            Err(AppError::InternalServerError)
        }

        async fn submit_progress(
            &self,
            _student_id: &str,
            _progress: &ProgressRequest,
        ) -> Result<QuizResult, AppError> {
            Err(AppError::Upstream("offline".to_string()))
        }
    }

    fn quiz_meeting() -> Meeting {
        Meeting {
            id: 3,
            module_id: 1,
            title: "Angka".to_string(),
            order: 1,
            content: MeetingContent {
                quiz: vec![
                    QuizQuestion {
                        question: "1+1?".to_string(),
                        options: vec!["2".into(), "3".into()],
                        correct_answer: 0,
                        image_url: None,
                    },
                    QuizQuestion {
                        question: "2+1?".to_string(),
                        options: vec!["2".into(), "3".into()],
                        correct_answer: 1,
                        image_url: None,
                    },
                ],
                ..MeetingContent::default()
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hardware_presses_drive_quiz_to_result() {
        let (mut device, host) = duplex(256);
        let (reader, writer) = tokio::io::split(host);
        let funbox = FunBox::connect(reader, writer);
        let handle = funbox.handle();
        let api = NoopApiClient {
            meeting: Some(quiz_meeting()),
            ..NoopApiClient::default()
        };
        let student = ActiveStudent::new("s-1");

        let meeting = api.fetch_meeting(3).await.expect("meeting");
        let session = MeetingSession::new(meeting);
        let run = tokio::spawn(async move {
            let result = run_meeting(session, &handle, &api, &student).await;
            (result, handle)
        });

        // Let the runner subscribe before the first press.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        device.write_all(b"A\n").await.expect("press A");
        tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
        device.write_all(b"INPUT: A\n").await.expect("press A");

        let (result, _handle) = run.await.expect("runner task");
        match result.expect("run") {
            MeetingRun::Finished { outcome, saved } => {
                assert!(saved);
                assert_eq!(outcome.raw_points, 1);
                assert_eq!(outcome.total_questions, 2);
                assert_eq!(outcome.score, 20);
                assert_eq!(outcome.stars, 1);
            }
            other => panic!("expected finished run, got {:?}", other),
        }

        let mut buf = [0u8; 16];
        device.read_exact(&mut buf).await.expect("read commands");
        assert_eq!(&buf, b"WIN\nLOSE\nFINISH\n");

        funbox.disconnect().await;
    }

    #[tokio::test]
    async fn test_failed_submission_still_shows_result() {
        let (mut device, host) = duplex(256);
        let (reader, writer) = tokio::io::split(host);
        let funbox = FunBox::connect(reader, writer);
        let handle = funbox.handle();
        let student = ActiveStudent::new("s-2");

        let mut meeting = quiz_meeting();
        meeting.content.quiz.clear();
        let session = MeetingSession::new(meeting);

        let run = run_meeting(session, &handle, &FailingApi, &student)
            .await
            .expect("run");
        match run {
            MeetingRun::Finished { saved, outcome } => {
                assert!(!saved);
                assert_eq!(outcome.score, 0);
            }
            other => panic!("expected finished run, got {:?}", other),
        }

        let mut buf = [0u8; 7];
        device.read_exact(&mut buf).await.expect("read finish");
        assert_eq!(&buf, b"FINISH\n");

        funbox.disconnect().await;
    }
}
