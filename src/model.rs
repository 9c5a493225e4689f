use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three form inputs a caption is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Subject,
    AttentionQuestion,
    Keyword,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Subject, Field::AttentionQuestion, Field::Keyword];

    pub fn label(self) -> &'static str {
        match self {
            Field::Subject => "Assunto do Reels",
            Field::AttentionQuestion => "Pergunta de Atenção",
            Field::Keyword => "Palavra-Chave (CTA)",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Field::Subject => "Ex: Como vender mais em 2024",
            Field::AttentionQuestion => "Ex: Você sente que seus resultados estagnaram?",
            Field::Keyword => "Ex: VENDAS",
        }
    }

    /// Name of the terminal command that edits this field.
    pub fn command(self) -> &'static str {
        match self {
            Field::Subject => "subject",
            Field::AttentionQuestion => "question",
            Field::Keyword => "keyword",
        }
    }

    /// Portuguese command word, accepted alongside [`Field::command`].
    pub fn alias(self) -> &'static str {
        match self {
            Field::Subject => "assunto",
            Field::AttentionQuestion => "pergunta",
            Field::Keyword => "palavra",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Form state. An empty (or whitespace-only) field counts as not provided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyInputs {
    pub subject: String,
    pub attention_question: String,
    pub keyword: String,
}

impl CopyInputs {
    pub fn new(
        subject: impl Into<String>,
        attention_question: impl Into<String>,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            attention_question: attention_question.into(),
            keyword: keyword.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Subject => &self.subject,
            Field::AttentionQuestion => &self.attention_question,
            Field::Keyword => &self.keyword,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Subject => &mut self.subject,
            Field::AttentionQuestion => &mut self.attention_question,
            Field::Keyword => &mut self.keyword,
        };
        *slot = value.into();
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display state of the current generation.
///
/// `error_message` is only set while `status` is [`Status::Error`]. `full_text`
/// is written on success and survives later transitions, so a failed retry
/// still carries the last good caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCopy {
    pub full_text: String,
    pub status: Status,
    pub error_message: Option<String>,
}

impl GeneratedCopy {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading(previous: &GeneratedCopy) -> Self {
        Self {
            full_text: previous.full_text.clone(),
            status: Status::Loading,
            error_message: None,
        }
    }

    pub fn success(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            status: Status::Success,
            error_message: None,
        }
    }

    pub fn failed(previous: &GeneratedCopy, message: impl Into<String>) -> Self {
        Self {
            full_text: previous.full_text.clone(),
            status: Status::Error,
            error_message: Some(message.into()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    pub fn can_copy(&self) -> bool {
        self.status == Status::Success && !self.full_text.is_empty()
    }
}
