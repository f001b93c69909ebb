//! Walking a form one question at a time.
//!
//! The nested factor → facet → question tree is flattened into presentation
//! order, and a [`Session`] tracks which question is current given the
//! answers already cached for the form.

use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Answer, Form, LikertValue, Question};

/// A question together with the facet and factor it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatQuestion {
    /// The question itself.
    pub question: Question,
    /// Owning facet id.
    pub facet_id: String,
    /// Owning facet name.
    pub facet_name: String,
    /// Owning factor id.
    pub factor_id: String,
    /// Owning factor name.
    pub factor_name: String,
}

impl FlatQuestion {
    /// Build the answer record for `value`.
    #[must_use]
    pub fn answer(&self, value: LikertValue) -> Answer {
        Answer {
            question_id: self.question.id.clone(),
            question_text: self.question.text.clone(),
            value,
            feedback: self.question.feedback.for_value(value).to_string(),
            facet_id: self.facet_id.clone(),
            factor_id: self.factor_id.clone(),
            answered_at: Utc::now(),
        }
    }
}

/// Flatten a form depth-first: factors, then facets, then questions.
#[must_use]
pub fn flatten(form: &Form) -> Vec<FlatQuestion> {
    form.factors
        .iter()
        .flat_map(|factor| {
            factor.facets.iter().flat_map(move |facet| {
                facet.questions.iter().map(move |question| FlatQuestion {
                    question: question.clone(),
                    facet_id: facet.id.clone(),
                    facet_name: facet.name.clone(),
                    factor_id: factor.id.clone(),
                    factor_name: factor.name.clone(),
                })
            })
        })
        .collect()
}

/// Outcome of answering the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Another question is waiting.
    Next,
    /// Every question has an answer.
    Finished,
}

/// Position tracking over a flattened form.
#[derive(Debug, Clone)]
pub struct Session {
    document_id: String,
    questions: Vec<FlatQuestion>,
    answered: HashSet<String>,
    index: usize,
}

impl Session {
    /// Start or resume a session for `form` given previously cached answers.
    ///
    /// The current question is the first one without an answer. Answers for
    /// questions no longer in the form are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoQuestions`] if the form has no questions.
    pub fn resume(form: &Form, answers: &[Answer]) -> Result<Self> {
        let questions = flatten(form);
        if questions.is_empty() {
            return Err(Error::NoQuestions {
                document_id: form.document_id.clone(),
            });
        }

        let known: HashSet<&str> = questions.iter().map(|q| q.question.id.as_str()).collect();
        let answered: HashSet<String> = answers
            .iter()
            .filter(|a| known.contains(a.question_id.as_str()))
            .map(|a| a.question_id.clone())
            .collect();

        let mut session = Self {
            document_id: form.document_id.clone(),
            questions,
            answered,
            index: 0,
        };
        session.index = session.next_unanswered_from(0);
        debug!(
            document_id = %session.document_id,
            position = session.index,
            answered = session.answered.len(),
            "resumed questionnaire"
        );
        Ok(session)
    }

    /// Index of the first unanswered question at or after `start`, wrapping
    /// to the beginning; `len()` when everything is answered.
    fn next_unanswered_from(&self, start: usize) -> usize {
        let len = self.questions.len();
        (start..len)
            .chain(0..start.min(len))
            .find(|&i| !self.answered.contains(&self.questions[i].question.id))
            .unwrap_or(len)
    }

    /// Document id of the form.
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Number of questions in the form.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; empty forms are rejected by [`Session::resume`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based position of the current question.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Number of questions with a cached answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    /// True once every question has an answer and no question is selected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// The current question, or `None` when complete.
    #[must_use]
    pub fn current(&self) -> Option<&FlatQuestion> {
        self.questions.get(self.index)
    }

    /// Whether the current question already has an answer (after [`Session::back`]).
    #[must_use]
    pub fn current_is_answered(&self) -> bool {
        self.current()
            .is_some_and(|q| self.answered.contains(&q.question.id))
    }

    /// Percentage shown on the progress bar: `(position + 1) / len * 100`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        if self.is_complete() {
            return 100.0;
        }
        (self.index + 1) as f64 / self.questions.len() as f64 * 100.0
    }

    /// "Question i of n" for the current position.
    #[must_use]
    pub fn position_label(&self) -> String {
        let shown = (self.index + 1).min(self.questions.len());
        format!("Question {shown} of {}", self.questions.len())
    }

    /// Answer the current question and move on.
    ///
    /// Returns the answer to persist together with whether questions remain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuestionnaireComplete`] if there is no current question.
    pub fn answer(&mut self, value: LikertValue) -> Result<(Answer, Step)> {
        let current = self.current().ok_or(Error::QuestionnaireComplete)?;
        let answer = current.answer(value);
        self.answered.insert(answer.question_id.clone());

        self.index = self.next_unanswered_from(self.index + 1);
        let step = if self.is_complete() {
            Step::Finished
        } else {
            Step::Next
        };
        Ok((answer, step))
    }

    /// Step back to the previous question so it can be re-answered.
    ///
    /// From the completed state this selects the last question. Returns
    /// `false` when already at the first question.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index = self.index.min(self.questions.len()) - 1;
        true
    }

    /// Answer the question with `question_id` directly, without moving the
    /// current position unless it pointed at that question.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownQuestion`] if the id is not part of the form.
    pub fn answer_question(&mut self, question_id: &str, value: LikertValue) -> Result<Answer> {
        let flat = self
            .questions
            .iter()
            .find(|q| q.question.id == question_id)
            .ok_or_else(|| Error::UnknownQuestion {
                document_id: self.document_id.clone(),
                question_id: question_id.to_string(),
            })?;
        let answer = flat.answer(value);
        self.answered.insert(answer.question_id.clone());
        if self.current().is_some_and(|q| q.question.id == question_id) {
            self.index = self.next_unanswered_from(self.index + 1);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{answer, sample_form};

    fn value(v: u8) -> LikertValue {
        LikertValue::new(v).unwrap()
    }

    #[test]
    fn flatten_preserves_tree_order() {
        let flat = flatten(&sample_form());
        let ids: Vec<&str> = flat.iter().map(|q| q.question.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5"]);

        assert_eq!(flat[2].facet_name, "Artistic interests");
        assert_eq!(flat[2].factor_name, "Openness");
        assert_eq!(flat[4].factor_id, "f-neuro");
    }

    #[test]
    fn fresh_session_starts_at_first_question() {
        let session = Session::resume(&sample_form(), &[]).unwrap();
        assert_eq!(session.position(), 0);
        assert_eq!(session.len(), 5);
        assert!(!session.is_complete());
        assert_eq!(session.position_label(), "Question 1 of 5");
        assert!((session.progress_percent() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn resume_skips_answered_questions() {
        let answers = vec![
            answer("q1", "fa-imag", "f-open", 4),
            answer("q2", "fa-imag", "f-open", 2),
        ];
        let session = Session::resume(&sample_form(), &answers).unwrap();
        assert_eq!(session.current().unwrap().question.id, "q3");
        assert_eq!(session.answered_count(), 2);
    }

    #[test]
    fn resume_finds_gap_before_later_answers() {
        let answers = vec![
            answer("q1", "fa-imag", "f-open", 4),
            answer("q3", "fa-art", "f-open", 2),
        ];
        let session = Session::resume(&sample_form(), &answers).unwrap();
        assert_eq!(session.current().unwrap().question.id, "q2");
    }

    #[test]
    fn resume_ignores_stale_answers() {
        let answers = vec![answer("gone", "fa-x", "f-x", 3)];
        let session = Session::resume(&sample_form(), &answers).unwrap();
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.position(), 0);
    }

    #[test]
    fn empty_form_is_rejected() {
        let mut form = sample_form();
        form.factors.clear();
        let err = Session::resume(&form, &[]).unwrap_err();
        assert!(matches!(err, Error::NoQuestions { .. }));
    }

    #[test]
    fn answering_picks_feedback_and_advances() {
        let mut session = Session::resume(&sample_form(), &[]).unwrap();

        let (first, step) = session.answer(value(1)).unwrap();
        assert_eq!(step, Step::Next);
        assert_eq!(first.question_id, "q1");
        assert_eq!(first.feedback, "q1 low");
        assert_eq!(first.facet_id, "fa-imag");
        assert_eq!(first.factor_id, "f-open");

        let (second, _) = session.answer(value(3)).unwrap();
        assert_eq!(second.feedback, "q2 medium");

        let (third, _) = session.answer(value(5)).unwrap();
        assert_eq!(third.feedback, "q3 high");
        assert_eq!(session.position(), 3);
    }

    #[test]
    fn reverse_scored_feedback_uses_raw_value() {
        let answers: Vec<Answer> = ["q1", "q2", "q3", "q4"]
            .iter()
            .map(|id| answer(id, "x", "y", 3))
            .collect();
        let mut session = Session::resume(&sample_form(), &answers).unwrap();
        let (last, step) = session.answer(value(5)).unwrap();
        assert_eq!(last.question_id, "q5");
        assert_eq!(last.feedback, "q5 high");
        assert_eq!(step, Step::Finished);
    }

    #[test]
    fn finishing_completes_the_session() {
        let mut session = Session::resume(&sample_form(), &[]).unwrap();
        for _ in 0..4 {
            assert_eq!(session.answer(value(4)).unwrap().1, Step::Next);
        }
        assert_eq!(session.answer(value(4)).unwrap().1, Step::Finished);
        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert!((session.progress_percent() - 100.0).abs() < f64::EPSILON);
        assert!(matches!(
            session.answer(value(4)),
            Err(Error::QuestionnaireComplete)
        ));
    }

    #[test]
    fn back_allows_reanswering() {
        let mut session = Session::resume(&sample_form(), &[]).unwrap();
        assert!(!session.back());

        session.answer(value(2)).unwrap();
        assert!(session.back());
        assert_eq!(session.current().unwrap().question.id, "q1");
        assert!(session.current_is_answered());

        let (again, _) = session.answer(value(5)).unwrap();
        assert_eq!(again.question_id, "q1");
        assert_eq!(session.current().unwrap().question.id, "q2");
    }

    #[test]
    fn back_from_complete_selects_last_question() {
        let answers: Vec<Answer> = ["q1", "q2", "q3", "q4", "q5"]
            .iter()
            .map(|id| answer(id, "x", "y", 3))
            .collect();
        let mut session = Session::resume(&sample_form(), &answers).unwrap();
        assert!(session.is_complete());
        assert!(session.back());
        assert_eq!(session.current().unwrap().question.id, "q5");
    }

    #[test]
    fn answer_question_by_id() {
        let mut session = Session::resume(&sample_form(), &[]).unwrap();
        let answer = session.answer_question("q4", value(2)).unwrap();
        assert_eq!(answer.facet_id, "fa-anx");
        assert_eq!(session.position(), 0);

        session.answer_question("q1", value(2)).unwrap();
        assert_eq!(session.current().unwrap().question.id, "q2");

        let err = session.answer_question("nope", value(2)).unwrap_err();
        assert!(matches!(err, Error::UnknownQuestion { .. }));
    }
}
