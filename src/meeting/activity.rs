use std::collections::HashSet;

use tracing::warn;

use crate::models::{Activity, Answer};
use crate::serial::Button;

/// What a single input did to an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ignored,
    Progress,
    Wrong,
    Complete,
}

/// Interaction state for the activity on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityProgress {
    /// Pick options; judged once as many picks as the answer needs are made.
    Selection {
        answer: Answer,
        options: usize,
        picked: Vec<usize>,
    },
    /// Press the expected index for each round in order. Used by drag-drop
    /// (target per item), body-parts-touch, match-line (partner per left
    /// entry) and the letter and reading races.
    Sequence {
        expected: Vec<usize>,
        choices: usize,
        done: usize,
    },
    /// Advance with NAV_NEXT through a fixed number of screens.
    StepThrough { remaining: usize },
    /// Typed answer, compared trimmed and case-insensitively.
    Text { expected: String },
}

/// Checks that the activity can be finished with the four answer buttons:
/// every expected index must be on a button and inside its option list, and
/// a multi answer needs at least one distinct pick.
pub fn completable(activity: &Activity) -> Result<(), String> {
    match activity {
        Activity::Choice {
            options, answer, ..
        } => check_answer(answer, options.len()),
        Activity::ImageGrid { images, answer, .. } => check_answer(answer, images.len()),
        Activity::DragDrop { targets, items, .. } => {
            check_indices(items.iter().map(|item| item.target), targets.len())
        }
        Activity::BodyPartsTouch {
            parts, sequence, ..
        } => check_indices(sequence.iter().copied(), parts.len()),
        Activity::MatchLine { right, matches, .. } => {
            check_indices(matches.iter().copied(), right.len())
        }
        Activity::AlphabetRace { rounds, .. } | Activity::ReadingRace { rounds, .. } => rounds
            .iter()
            .try_for_each(|round| check_indices(std::iter::once(round.answer), round.options.len())),
        Activity::AnimalMimic { .. } | Activity::TextInput { .. } | Activity::Info { .. } => Ok(()),
    }
}

fn check_answer(answer: &Answer, options: usize) -> Result<(), String> {
    match answer {
        Answer::Single(index) => check_indices(std::iter::once(*index), options),
        Answer::Multi(picks) => {
            if picks.is_empty() {
                return Err("multi answer has no picks".to_string());
            }
            let distinct: HashSet<_> = picks.iter().collect();
            if distinct.len() != picks.len() {
                return Err(format!("multi answer {:?} repeats a pick", picks));
            }
            check_indices(picks.iter().copied(), options)
        }
    }
}

fn check_indices(indices: impl IntoIterator<Item = usize>, options: usize) -> Result<(), String> {
    let reachable = options.min(Button::ANSWER_COUNT);
    match indices.into_iter().find(|index| *index >= reachable) {
        Some(index) => Err(format!(
            "index {} is out of reach ({} options, {} answer buttons)",
            index,
            options,
            Button::ANSWER_COUNT
        )),
        None => Ok(()),
    }
}

impl ActivityProgress {
    /// Activities that cannot be finished on the box turn into a single
    /// NAV_NEXT screen.
    pub fn for_activity(activity: &Activity) -> Self {
        if let Err(reason) = completable(activity) {
            warn!("{} activity cannot be completed ({}), stepping over it", activity.kind(), reason);
            return ActivityProgress::StepThrough { remaining: 1 };
        }

        let progress = match activity {
            Activity::Choice {
                options, answer, ..
            } => ActivityProgress::Selection {
                answer: answer.clone(),
                options: options.len(),
                picked: Vec::new(),
            },
            Activity::ImageGrid { images, answer, .. } => ActivityProgress::Selection {
                answer: answer.clone(),
                options: images.len(),
                picked: Vec::new(),
            },
            Activity::DragDrop { targets, items, .. } => ActivityProgress::Sequence {
                expected: items.iter().map(|item| item.target).collect(),
                choices: targets.len(),
                done: 0,
            },
            Activity::BodyPartsTouch {
                parts, sequence, ..
            } => ActivityProgress::Sequence {
                expected: sequence.clone(),
                choices: parts.len(),
                done: 0,
            },
            Activity::MatchLine { right, matches, .. } => ActivityProgress::Sequence {
                expected: matches.clone(),
                choices: right.len(),
                done: 0,
            },
            Activity::AlphabetRace { rounds, .. } | Activity::ReadingRace { rounds, .. } => {
                ActivityProgress::Sequence {
                    expected: rounds.iter().map(|round| round.answer).collect(),
                    choices: rounds.iter().map(|round| round.options.len()).max().unwrap_or(0),
                    done: 0,
                }
            }
            Activity::AnimalMimic { animals, .. } => ActivityProgress::StepThrough {
                remaining: animals.len(),
            },
            Activity::TextInput { answer, .. } => ActivityProgress::Text {
                expected: answer.clone(),
            },
            Activity::Info { .. } => ActivityProgress::StepThrough { remaining: 1 },
        };

        // Nothing to interact with still needs one NAV_NEXT to move on.
        match progress {
            ActivityProgress::Sequence { ref expected, .. } if expected.is_empty() => {
                ActivityProgress::StepThrough { remaining: 1 }
            }
            ActivityProgress::StepThrough { remaining: 0 } => {
                ActivityProgress::StepThrough { remaining: 1 }
            }
            other => other,
        }
    }

    pub fn press(&mut self, button: Button) -> Reply {
        match self {
            ActivityProgress::Selection {
                answer,
                options,
                picked,
            } => {
                let Some(index) = button.answer_index() else {
                    return Reply::Ignored;
                };
                if index >= *options {
                    return Reply::Ignored;
                }
                if let Some(pos) = picked.iter().position(|p| *p == index) {
                    picked.remove(pos);
                    return Reply::Progress;
                }
                picked.push(index);
                if picked.len() < answer.picks() {
                    return Reply::Progress;
                }
                if answer.matches(picked) {
                    Reply::Complete
                } else {
                    picked.clear();
                    Reply::Wrong
                }
            }
            ActivityProgress::Sequence {
                expected,
                choices,
                done,
            } => {
                let Some(index) = button.answer_index() else {
                    return Reply::Ignored;
                };
                if index >= *choices || *done >= expected.len() {
                    return Reply::Ignored;
                }
                if expected[*done] != index {
                    return Reply::Wrong;
                }
                *done += 1;
                if *done == expected.len() {
                    Reply::Complete
                } else {
                    Reply::Progress
                }
            }
            ActivityProgress::StepThrough { remaining } => {
                if button != Button::NAV_NEXT || *remaining == 0 {
                    return Reply::Ignored;
                }
                *remaining -= 1;
                if *remaining == 0 {
                    Reply::Complete
                } else {
                    Reply::Progress
                }
            }
            ActivityProgress::Text { .. } => Reply::Ignored,
        }
    }

    pub fn submit_text(&mut self, text: &str) -> Reply {
        match self {
            ActivityProgress::Text { expected } => {
                if text.trim().to_lowercase() == expected.trim().to_lowercase() {
                    Reply::Complete
                } else {
                    Reply::Wrong
                }
            }
            _ => Reply::Ignored,
        }
    }

    pub fn needs_text(&self) -> bool {
        matches!(self, ActivityProgress::Text { .. })
    }
}
