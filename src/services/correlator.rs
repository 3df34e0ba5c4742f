//! 结果关联 - 业务能力层
//!
//! 把答案按 `question_id` 挂到对应的问题上，纯函数，无 I/O

use crate::models::{Answer, QaPair, Question};
use std::collections::HashMap;

/// 关联问题与答案
///
/// - 输出顺序与 `questions` 一致，长度相同
/// - 每个问题最多匹配一个答案；同一问题有多个答案时取第一个
/// - 找不到问题的答案被忽略
pub fn correlate(questions: &[Question], answers: &[Answer]) -> Vec<QaPair> {
    let mut by_question: HashMap<&str, &Answer> = HashMap::with_capacity(answers.len());
    for answer in answers {
        by_question
            .entry(answer.question_id.as_str())
            .or_insert(answer);
    }

    questions
        .iter()
        .map(|question| QaPair {
            question: question.clone(),
            answer: by_question.get(question.id.as_str()).map(|a| (*a).clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, text: &str) -> Question {
        Question {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn a(qid: &str, text: &str) -> Answer {
        Answer {
            question_id: qid.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_preserves_question_order() {
        let questions = vec![q("3", "c"), q("1", "a"), q("2", "b")];
        let answers = vec![a("1", "A"), a("2", "B"), a("3", "C")];

        let pairs = correlate(&questions, &answers);

        assert_eq!(pairs.len(), 3);
        let ids: Vec<&str> = pairs.iter().map(|p| p.question.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        for pair in &pairs {
            let answer = pair.answer.as_ref().unwrap();
            assert_eq!(answer.question_id, pair.question.id);
        }
    }

    #[test]
    fn test_missing_answer_is_absent() {
        let questions = vec![q("1", "a"), q("2", "b")];
        let answers = vec![a("2", "B")];

        let pairs = correlate(&questions, &answers);

        assert!(pairs[0].answer.is_none());
        assert_eq!(pairs[1].answer.as_ref().unwrap().text, "B");
    }

    #[test]
    fn test_orphan_answers_ignored() {
        let questions = vec![q("1", "a")];
        let answers = vec![a("99", "orphan"), a("1", "A")];

        let pairs = correlate(&questions, &answers);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer.as_ref().unwrap().text, "A");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(correlate(&[], &[a("1", "A")]).is_empty());

        let pairs = correlate(&[q("1", "a")], &[]);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].answer.is_none());
    }

    #[test]
    fn test_duplicate_answers_first_wins() {
        let pairs = correlate(&[q("1", "a")], &[a("1", "first"), a("1", "second")]);
        assert_eq!(pairs[0].answer.as_ref().unwrap().text, "first");
    }
}
