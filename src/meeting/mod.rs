//! Step sequencing for a single meeting: videos, story, activities, quiz,
//! result.
//!
//! The session is a plain state machine. Inputs go in through
//! [`MeetingSession::handle_button`] and friends; side effects come back as
//! [`Effect`] values for the caller to perform, so timing and I/O stay
//! outside.

pub mod activity;

use std::time::Duration;

use tracing::{debug, info};

use crate::models::{Meeting, ProgressRequest};
use crate::scoring::{self, StarBands};
use crate::serial::{Button, Command};

pub use activity::{ActivityProgress, Reply, completable};

/// How long quiz feedback stays up before the next question.
pub const QUIZ_FEEDBACK: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Video(usize),
    Story,
    Activity(usize),
    Quiz,
    Result,
    /// Backed out past the first step, to the module's meeting list.
    Exited,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(Command),
    Celebrate,
    /// Call [`MeetingSession::advance_after_feedback`] after this delay.
    ScheduleAdvance(Duration),
    Submit(ProgressRequest),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub selected: usize,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingOutcome {
    pub raw_points: i64,
    pub total_questions: i64,
    pub score: u8,
    pub stars: u8,
    pub passed: bool,
}

#[derive(Debug, Default)]
struct QuizState {
    current: usize,
    correct: usize,
    feedback: Option<Feedback>,
}

pub struct MeetingSession {
    meeting: Meeting,
    steps: Vec<Step>,
    step: Step,
    quiz: QuizState,
    activity: Option<ActivityProgress>,
    bands: StarBands,
    outcome: Option<MeetingOutcome>,
}

impl MeetingSession {
    pub fn new(meeting: Meeting) -> Self {
        Self::with_bands(meeting, StarBands::default())
    }

    pub fn with_bands(meeting: Meeting, bands: StarBands) -> Self {
        let steps = plan_steps(&meeting);
        let step = steps[0];
        let mut session = Self {
            meeting,
            steps,
            step,
            quiz: QuizState::default(),
            activity: None,
            bands,
            outcome: None,
        };
        session.reset_step_state();
        session
    }

    /// Effects owed on entry, such as finishing a meeting whose quiz is empty.
    pub fn start(&mut self) -> Vec<Effect> {
        info!(
            "starting meeting {} ({}) at {:?}",
            self.meeting.id, self.meeting.title, self.step
        );
        self.on_enter()
    }

    pub fn meeting(&self) -> &Meeting {
        &self.meeting
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current_quiz_index(&self) -> usize {
        self.quiz.current
    }

    pub fn correct_count(&self) -> usize {
        self.quiz.correct
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.quiz.feedback
    }

    pub fn activity_progress(&self) -> Option<&ActivityProgress> {
        self.activity.as_ref()
    }

    pub fn outcome(&self) -> Option<MeetingOutcome> {
        self.outcome
    }

    pub fn handle_button(&mut self, button: Button) -> Vec<Effect> {
        if button == Button::NAV_BACK {
            return self.back();
        }

        match self.step {
            Step::Video(_) | Step::Story => {
                if button == Button::NAV_NEXT {
                    self.next()
                } else {
                    Vec::new()
                }
            }
            Step::Activity(_) => self.press_activity(button),
            Step::Quiz => match button.answer_index() {
                Some(index) => self.answer(index),
                None => Vec::new(),
            },
            Step::Result => {
                if button == Button::NAV_NEXT {
                    self.next()
                } else {
                    Vec::new()
                }
            }
            Step::Exited => Vec::new(),
        }
    }

    /// Moves forward one step. Does nothing during the quiz, which only
    /// advances through answers.
    pub fn next(&mut self) -> Vec<Effect> {
        match self.step {
            Step::Quiz | Step::Exited => Vec::new(),
            Step::Result => {
                self.step = Step::Exited;
                vec![Effect::Exit]
            }
            _ => match self.position().and_then(|pos| self.steps.get(pos + 1)).copied() {
                Some(next) => self.go_to(next),
                None => Vec::new(),
            },
        }
    }

    /// Returns to the previous step, or leaves the meeting from the first.
    pub fn back(&mut self) -> Vec<Effect> {
        match self.step {
            Step::Result | Step::Exited => return Vec::new(),
            Step::Quiz if self.quiz.feedback.is_some() => return Vec::new(),
            _ => {}
        }

        match self.position() {
            Some(pos) if pos > 0 => {
                let previous = self.steps[pos - 1];
                self.go_to(previous)
            }
            _ => {
                debug!("leaving meeting {}", self.meeting.id);
                self.step = Step::Exited;
                vec![Effect::Exit]
            }
        }
    }

    pub fn answer(&mut self, index: usize) -> Vec<Effect> {
        if self.step != Step::Quiz || self.quiz.feedback.is_some() {
            return Vec::new();
        }
        let Some(question) = self.meeting.content.quiz.get(self.quiz.current) else {
            return Vec::new();
        };
        if index >= question.options.len() {
            return Vec::new();
        }

        let correct = index == question.correct_answer;
        if correct {
            self.quiz.correct += 1;
        }
        self.quiz.feedback = Some(Feedback {
            selected: index,
            correct,
        });
        debug!(
            "quiz {} answered {} ({})",
            self.quiz.current,
            index,
            if correct { "correct" } else { "wrong" }
        );

        let mut effects = Vec::with_capacity(3);
        if correct {
            effects.push(Effect::Send(Command::Win));
            effects.push(Effect::Celebrate);
        } else {
            effects.push(Effect::Send(Command::Lose));
        }
        effects.push(Effect::ScheduleAdvance(QUIZ_FEEDBACK));
        effects
    }

    /// Ends the feedback window: next question, or the result after the last.
    pub fn advance_after_feedback(&mut self) -> Vec<Effect> {
        if self.step != Step::Quiz || self.quiz.feedback.take().is_none() {
            return Vec::new();
        }

        if self.quiz.current + 1 < self.meeting.content.quiz.len() {
            self.quiz.current += 1;
            Vec::new()
        } else {
            self.finish()
        }
    }

    pub fn submit_text(&mut self, text: &str) -> Vec<Effect> {
        let reply = match (&self.step, self.activity.as_mut()) {
            (Step::Activity(_), Some(progress)) => progress.submit_text(text),
            _ => Reply::Ignored,
        };
        self.on_activity_reply(reply)
    }

    /// Moves past the current activity without completing it, for activities
    /// the input device cannot answer.
    pub fn skip_activity(&mut self) -> Vec<Effect> {
        match self.step {
            Step::Activity(_) => self.next(),
            _ => Vec::new(),
        }
    }

    fn press_activity(&mut self, button: Button) -> Vec<Effect> {
        let reply = match self.activity.as_mut() {
            Some(progress) => progress.press(button),
            None => Reply::Ignored,
        };
        self.on_activity_reply(reply)
    }

    fn on_activity_reply(&mut self, reply: Reply) -> Vec<Effect> {
        match reply {
            Reply::Ignored | Reply::Progress => Vec::new(),
            Reply::Wrong => vec![Effect::Send(Command::Retry)],
            Reply::Complete => {
                let mut effects = vec![Effect::Send(Command::Good)];
                effects.extend(self.next());
                effects
            }
        }
    }

    fn finish(&mut self) -> Vec<Effect> {
        let raw_points = self.quiz.correct as i64;
        let total_questions = self.meeting.content.quiz.len() as i64;
        let score =
            scoring::calculate_meeting_score(raw_points, self.meeting.module_id, self.meeting.order);
        let stars = self.bands.stars_for(score);
        let outcome = MeetingOutcome {
            raw_points,
            total_questions,
            score,
            stars,
            passed: scoring::passes_meeting(score),
        };
        self.outcome = Some(outcome);
        self.step = Step::Result;

        info!(
            "meeting {} finished: {} correct, score {}, {} stars",
            self.meeting.id, raw_points, score, stars
        );

        let mut effects = vec![Effect::Send(Command::Finish)];
        if outcome.passed {
            effects.push(Effect::Send(Command::Victory));
        }
        effects.push(Effect::Submit(ProgressRequest {
            student_id: None,
            meeting_id: self.meeting.id,
            module_id: self.meeting.module_id,
            meeting_order: self.meeting.order,
            raw_points,
            total_questions,
            score: i64::from(score),
            stars: i64::from(stars),
        }));
        effects
    }

    fn go_to(&mut self, step: Step) -> Vec<Effect> {
        debug!("meeting {}: {:?} -> {:?}", self.meeting.id, self.step, step);
        self.step = step;
        self.reset_step_state();
        self.on_enter()
    }

    fn reset_step_state(&mut self) {
        self.activity = match self.step {
            Step::Activity(i) => self
                .meeting
                .content
                .activities
                .get(i)
                .map(ActivityProgress::for_activity),
            _ => None,
        };
        // Leaving or re-entering the quiz starts it over.
        self.quiz = QuizState::default();
    }

    fn on_enter(&mut self) -> Vec<Effect> {
        if self.step == Step::Quiz && self.meeting.content.quiz.is_empty() {
            return self.finish();
        }
        Vec::new()
    }

    fn position(&self) -> Option<usize> {
        self.steps.iter().position(|s| *s == self.step)
    }
}

/// Steps present in the meeting content. A meeting with neither videos nor
/// activities goes straight to the quiz.
fn plan_steps(meeting: &Meeting) -> Vec<Step> {
    let content = &meeting.content;
    if content.videos.is_empty() && content.activities.is_empty() {
        return vec![Step::Quiz];
    }

    let mut steps: Vec<Step> = (0..content.videos.len()).map(Step::Video).collect();
    if content.story.is_some() {
        steps.push(Step::Story);
    }
    steps.extend((0..content.activities.len()).map(Step::Activity));
    steps.push(Step::Quiz);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Answer, MeetingContent, QuizQuestion, Story, Video};

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            question: "Berapa?".to_string(),
            options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            correct_answer: correct,
            image_url: None,
        }
    }

    fn video() -> Video {
        Video {
            url: "https://example.com/v.mp4".to_string(),
            title: None,
        }
    }

    fn meeting(content: MeetingContent) -> Meeting {
        Meeting {
            id: 7,
            module_id: 1,
            title: "Pertemuan 1".to_string(),
            order: 1,
            content,
        }
    }

    fn five_questions() -> Vec<QuizQuestion> {
        vec![question(0), question(1), question(2), question(3), question(0)]
    }

    #[test]
    fn test_no_video_no_activity_starts_in_quiz() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            story: Some(Story {
                title: "Cerita".to_string(),
                pages: Vec::new(),
                image_url: None,
            }),
            quiz: five_questions(),
            ..MeetingContent::default()
        }));
        assert_eq!(session.step(), Step::Quiz);
        assert!(session.start().is_empty());
        assert_eq!(session.steps(), &[Step::Quiz]);
    }

    #[test]
    fn test_full_sequence_and_back_navigation() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            videos: vec![video(), video()],
            story: Some(Story {
                title: "Cerita".to_string(),
                pages: vec!["Halaman 1".to_string()],
                image_url: None,
            }),
            activities: vec![
                Activity::Info { text: "Siap?".to_string() },
                Activity::Info { text: "Ayo!".to_string() },
            ],
            quiz: five_questions(),
            ..MeetingContent::default()
        }));
        assert_eq!(session.step(), Step::Video(0));

        session.handle_button(Button::A);
        assert_eq!(session.step(), Step::Video(0));
        session.handle_button(Button::NAV_NEXT);
        assert_eq!(session.step(), Step::Video(1));
        session.handle_button(Button::NAV_NEXT);
        assert_eq!(session.step(), Step::Story);
        session.handle_button(Button::NAV_NEXT);
        assert_eq!(session.step(), Step::Activity(0));

        let effects = session.handle_button(Button::NAV_NEXT);
        assert_eq!(effects, vec![Effect::Send(Command::Good)]);
        assert_eq!(session.step(), Step::Activity(1));

        session.handle_button(Button::NAV_BACK);
        assert_eq!(session.step(), Step::Activity(0));
        session.handle_button(Button::NAV_BACK);
        assert_eq!(session.step(), Step::Story);
        session.handle_button(Button::NAV_BACK);
        assert_eq!(session.step(), Step::Video(1));
        session.handle_button(Button::NAV_BACK);
        assert_eq!(session.step(), Step::Video(0));
        let effects = session.handle_button(Button::NAV_BACK);
        assert_eq!(effects, vec![Effect::Exit]);
        assert_eq!(session.step(), Step::Exited);
    }

    #[test]
    fn test_quiz_feedback_blocks_answers_and_scores() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            quiz: five_questions(),
            ..MeetingContent::default()
        }));

        let effects = session.handle_button(Button::A);
        assert_eq!(
            effects,
            vec![
                Effect::Send(Command::Win),
                Effect::Celebrate,
                Effect::ScheduleAdvance(QUIZ_FEEDBACK),
            ]
        );
        assert!(session.handle_button(Button::B).is_empty());
        assert!(session.handle_button(Button::NAV_BACK).is_empty());
        assert_eq!(session.correct_count(), 1);
        assert!(session.advance_after_feedback().is_empty());
        assert_eq!(session.current_quiz_index(), 1);

        // Correct on questions 2..4, wrong on the last: 4 of 5.
        for button in [Button::B, Button::C, Button::D] {
            session.handle_button(button);
            session.advance_after_feedback();
        }
        let effects = session.handle_button(Button::B);
        assert_eq!(effects[0], Effect::Send(Command::Lose));

        let effects = session.advance_after_feedback();
        assert_eq!(session.step(), Step::Result);
        assert_eq!(effects[0], Effect::Send(Command::Finish));
        assert_eq!(effects[1], Effect::Send(Command::Victory));
        match &effects[2] {
            Effect::Submit(req) => {
                assert_eq!(req.meeting_id, 7);
                assert_eq!(req.raw_points, 4);
                assert_eq!(req.total_questions, 5);
                assert_eq!(req.score, 80);
                assert_eq!(req.stars, 3);
            }
            other => panic!("expected submit, got {:?}", other),
        }
        let outcome = session.outcome().expect("outcome");
        assert!(outcome.passed);

        assert_eq!(session.handle_button(Button::NAV_NEXT), vec![Effect::Exit]);
    }

    #[test]
    fn test_failed_meeting_has_no_victory() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            quiz: vec![question(0), question(1)],
            ..MeetingContent::default()
        }));
        session.handle_button(Button::A);
        session.advance_after_feedback();
        session.handle_button(Button::A);
        let effects = session.advance_after_feedback();

        // 1 of 5 max points for module 1 meeting 1.
        assert_eq!(session.outcome().map(|o| o.score), Some(20));
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0], Effect::Send(Command::Finish));
        assert!(matches!(effects[1], Effect::Submit(_)));
    }

    #[test]
    fn test_back_from_quiz_returns_to_last_activity_and_restarts_quiz() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            activities: vec![
                Activity::Info { text: "Satu".to_string() },
                Activity::Info { text: "Dua".to_string() },
            ],
            quiz: five_questions(),
            ..MeetingContent::default()
        }));
        session.handle_button(Button::NAV_NEXT);
        session.handle_button(Button::NAV_NEXT);
        assert_eq!(session.step(), Step::Quiz);

        session.handle_button(Button::A);
        session.advance_after_feedback();
        assert_eq!(session.current_quiz_index(), 1);
        assert_eq!(session.correct_count(), 1);

        session.handle_button(Button::NAV_BACK);
        assert_eq!(session.step(), Step::Activity(1));
        assert_eq!(session.current_quiz_index(), 0);
        assert_eq!(session.correct_count(), 0);
        assert!(session.feedback().is_none());

        session.handle_button(Button::NAV_NEXT);
        assert_eq!(session.step(), Step::Quiz);
        assert_eq!(session.current_quiz_index(), 0);
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn test_advance_without_feedback_is_noop() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            quiz: five_questions(),
            ..MeetingContent::default()
        }));
        assert!(session.advance_after_feedback().is_empty());
        assert_eq!(session.current_quiz_index(), 0);
    }

    #[test]
    fn test_empty_quiz_finishes_on_start() {
        let mut session = MeetingSession::new(meeting(MeetingContent::default()));
        let effects = session.start();
        assert_eq!(session.step(), Step::Result);
        assert_eq!(effects.len(), 2);
        assert_eq!(session.outcome().expect("outcome").score, 0);
    }

    #[test]
    fn test_wrong_activity_answer_sends_retry() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            activities: vec![Activity::Choice {
                instruction: "Pilih".to_string(),
                options: vec!["a".into(), "b".into()],
                answer: Answer::Single(1),
            }],
            quiz: five_questions(),
            ..MeetingContent::default()
        }));
        assert_eq!(session.step(), Step::Activity(0));
        assert_eq!(session.handle_button(Button::NAV_NEXT), Vec::new());
        assert_eq!(
            session.handle_button(Button::A),
            vec![Effect::Send(Command::Retry)]
        );
        assert_eq!(
            session.handle_button(Button::B),
            vec![Effect::Send(Command::Good)]
        );
        assert_eq!(session.step(), Step::Quiz);
    }

    #[test]
    fn test_text_activity_can_be_skipped() {
        let mut session = MeetingSession::new(meeting(MeetingContent {
            activities: vec![Activity::TextInput {
                instruction: "Tulis".to_string(),
                answer: "ibu".to_string(),
            }],
            quiz: five_questions(),
            ..MeetingContent::default()
        }));
        assert!(session.activity_progress().expect("progress").needs_text());
        assert_eq!(
            session.submit_text("Ibu"),
            vec![Effect::Send(Command::Good)]
        );
        assert_eq!(session.step(), Step::Quiz);

        session.back();
        assert_eq!(session.step(), Step::Activity(0));
        session.skip_activity();
        assert_eq!(session.step(), Step::Quiz);
    }
}
