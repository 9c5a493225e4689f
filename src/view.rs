//! Plain-text rendering of the form and the generation state.

use owo_colors::OwoColorize;

use crate::model::{CopyInputs, Field, GeneratedCopy, Status};

const RULE_WIDTH: usize = 48;
const HELP_COLUMN: usize = 28;

const ACTIONS: [(&str, &str, &str); 6] = [
    ("gerar", "generate", "gera a legenda"),
    ("copiar", "copy", "copia a legenda gerada"),
    ("mostrar", "show", "mostra o formulário e a prévia"),
    ("limpar", "clear", "limpa os campos"),
    ("ajuda", "help", "mostra esta ajuda"),
    ("sair", "quit", "sai"),
];

pub fn render_form(inputs: &CopyInputs, use_color: bool) -> String {
    let mut lines = vec![heading("Configuração do Reels", use_color)];
    for field in Field::ALL {
        let value = inputs.get(field).trim();
        let shown = if value.is_empty() {
            let hint = format!("(vazio) {}", field.placeholder());
            paint(&hint, use_color, Paint::Dim)
        } else {
            value.to_string()
        };
        lines.push(format!("  {:<22} {}", field.label(), shown));
    }
    lines.join("\n")
}

pub fn render_state(state: &GeneratedCopy, copied: bool, use_color: bool) -> String {
    let mut lines = vec![heading("Preview da Legenda", use_color)];

    match state.status {
        Status::Idle => {
            lines.push("Pronto para brilhar?".to_string());
            lines.push(paint(
                "Preencha os campos e digite `gerar` para ver a mágica acontecer.",
                use_color,
                Paint::Dim,
            ));
        }
        Status::Loading => {
            lines.push(paint("⏳ Criando sua obra-prima...", use_color, Paint::Accent));
        }
        Status::Error => {
            lines.push(paint("⚠ Ops! Algo deu errado", use_color, Paint::Error));
            if let Some(message) = &state.error_message {
                lines.push(message.clone());
            }
        }
        Status::Success => {
            lines.push(state.full_text.clone());
            lines.push(String::new());
            lines.push(copy_button(copied, use_color));
        }
    }

    lines.join("\n")
}

pub fn copy_button(copied: bool, use_color: bool) -> String {
    if copied {
        paint("[ ✔ Copiado! ]", use_color, Paint::Success)
    } else {
        paint("[ Copiar Legenda ] (digite `copiar`)", use_color, Paint::Accent)
    }
}

pub fn help() -> String {
    let mut lines = vec!["Comandos (em português ou inglês):".to_string()];
    for field in Field::ALL {
        lines.push(format!(
            "  {:<width$} define \"{}\" (sem texto: pergunta em seguida)",
            format!("{} | {} <texto>", field.alias(), field.command()),
            field.label(),
            width = HELP_COLUMN
        ));
    }
    for (word, alias, description) in ACTIONS {
        lines.push(format!(
            "  {:<width$} {}",
            format!("{} | {}", word, alias),
            description,
            width = HELP_COLUMN
        ));
    }
    lines.join("\n")
}

#[derive(Clone, Copy)]
enum Paint {
    Dim,
    Accent,
    Error,
    Success,
}

fn paint(text: &str, use_color: bool, style: Paint) -> String {
    if !use_color {
        return text.to_string();
    }
    match style {
        Paint::Dim => text.dimmed().to_string(),
        Paint::Accent => text.magenta().to_string(),
        Paint::Error => text.red().bold().to_string(),
        Paint::Success => text.green().bold().to_string(),
    }
}

fn heading(title: &str, use_color: bool) -> String {
    let padding = RULE_WIDTH.saturating_sub(title.chars().count() + 4);
    let line = format!("── {} {}", title, "─".repeat(padding));
    if use_color {
        line.bold().to_string()
    } else {
        line
    }
}
