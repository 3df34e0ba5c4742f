use crate::models::de;
use serde::{Deserialize, Serialize};

/// 从转写文本中拆分出的问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(rename = "question")]
    pub text: String,
}

/// 生成的答案，通过 `question_id` 关联到问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "qid", deserialize_with = "de::id")]
    pub question_id: String,
    #[serde(rename = "answer")]
    pub text: String,
}

/// 问题与其匹配的答案（可能没有）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: Question,
    pub answer: Option<Answer>,
}

/// 已完成任务的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobResult {
    pub transcript: String,
    pub pairs: Vec<QaPair>,
}

impl JobResult {
    /// 没有匹配到答案的问题数
    pub fn unanswered(&self) -> usize {
        self.pairs.iter().filter(|p| p.answer.is_none()).count()
    }
}
