use anyhow::{anyhow, Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::clipboard;
use crate::config::{Config, ConfigManager};
use crate::controller::{CaptionController, CopyOutcome};
use crate::generation::{CaptionGenerator, GeminiClient};
use crate::model::{Field, Status};
use crate::view;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Field, String),
    Prompt(Field),
    Generate,
    Copy,
    Show,
    Clear,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let field = match head.to_lowercase().as_str() {
            "subject" | "assunto" => Some(Field::Subject),
            "question" | "pergunta" => Some(Field::AttentionQuestion),
            "keyword" | "palavra" => Some(Field::Keyword),
            _ => None,
        };

        if let Some(field) = field {
            return if rest.is_empty() {
                Command::Prompt(field)
            } else {
                Command::Set(field, rest.to_string())
            };
        }

        match head.to_lowercase().as_str() {
            "generate" | "gerar" => Command::Generate,
            "copy" | "copiar" => Command::Copy,
            "show" | "mostrar" => Command::Show,
            "clear" | "limpar" => Command::Clear,
            "help" | "ajuda" | "?" => Command::Help,
            "quit" | "exit" | "sair" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct ReelsCopyApp {
    config_manager: ConfigManager,
    api_key: String,
    controller: CaptionController,
    current_config: Config,
    deferred_config: Option<Config>,
    pending_field: Option<Field>,
    use_color: bool,
}

impl ReelsCopyApp {
    pub fn new(config_manager: ConfigManager, api_key: String) -> Result<Self> {
        let config = config_manager.get();

        let generator = Self::build_generator(&api_key, &config)
            .context("Failed to configure caption generator")?;
        info!(
            "🎯 Active generation backend: {} ({})",
            generator.name(),
            generator.model()
        );

        let controller = CaptionController::new(
            Arc::new(generator),
            clipboard::from_config(config.clipboard_enabled),
            config.copy_feedback(),
        );

        Ok(Self {
            config_manager,
            api_key,
            controller,
            current_config: config,
            deferred_config: None,
            pending_field: None,
            use_color: std::io::stdout().is_terminal(),
        })
    }

    fn build_generator(api_key: &str, config: &Config) -> Result<GeminiClient> {
        let client = GeminiClient::new(
            api_key.to_string(),
            &config.gemini,
            config.request_timeout(),
        )?;
        client.initialize()?;
        Ok(client)
    }

    pub async fn run(mut self) -> Result<()> {
        info!("🚀 reelscopy running! Type `ajuda` for commands.");
        println!("{}", view::render_form(self.controller.inputs(), self.use_color));
        println!();
        println!("{}", view::help());

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin).lines();
        let mut state_rx = self.controller.subscribe();
        let mut copied_rx = self.controller.copied_receiver();
        let mut config_rx = self.config_manager.subscribe();

        loop {
            tokio::select! {
                line = reader.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if self.handle_line(&line) == Flow::Quit {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => return Err(e).context("Failed to read from stdin"),
                    }
                }
                result = state_rx.changed() => {
                    if result.is_err() {
                        break;
                    }
                    let state = state_rx.borrow_and_update().clone();
                    println!();
                    println!("{}", view::render_state(&state, self.controller.is_copied(), self.use_color));
                    if state.status != Status::Loading {
                        self.apply_pending_config();
                    }
                }
                result = copied_rx.changed() => {
                    if result.is_err() {
                        break;
                    }
                    let copied = *copied_rx.borrow_and_update();
                    if self.controller.snapshot().status == Status::Success {
                        println!("{}", view::copy_button(copied, self.use_color));
                    }
                }
                result = config_rx.changed() => {
                    match result {
                        Ok(()) => {
                            let updated = config_rx.borrow_and_update().clone();
                            if let Err(err) = self.apply_config_update(updated) {
                                error!("Failed to apply config update: {:#}", err);
                            }
                        }
                        Err(_) => return Err(anyhow!("Configuration watcher closed")),
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let command = Command::parse(line);

        // guided entry: free text answers the pending prompt, commands still run
        if let Some(field) = self.pending_field.take() {
            if let Command::Unknown(value) = &command {
                self.controller.set_field(field, value.as_str());
                debug!(field = field.command(), "Field updated");
                return Flow::Continue;
            }
        }

        match command {
            Command::Set(field, value) => {
                self.controller.set_field(field, value);
                debug!(field = field.command(), "Field updated");
            }
            Command::Prompt(field) => {
                println!("{}:", field.label());
                self.pending_field = Some(field);
            }
            Command::Generate => {
                // the task publishes its result through the state channel
                if let Err(err) = self.controller.submit() {
                    println!("{}", err);
                }
            }
            Command::Copy => match self.controller.copy() {
                Ok(CopyOutcome::Copied) => {}
                Ok(CopyOutcome::Unavailable) => println!("Nada para copiar ainda."),
                Err(err) => {
                    warn!("Copy failed: {:#}", err);
                    println!("Não foi possível copiar a legenda.");
                }
            },
            Command::Show => {
                println!("{}", view::render_form(self.controller.inputs(), self.use_color));
                println!();
                println!(
                    "{}",
                    view::render_state(
                        &self.controller.snapshot(),
                        self.controller.is_copied(),
                        self.use_color
                    )
                );
            }
            Command::Clear => {
                self.controller.clear_inputs();
                println!("{}", view::render_form(self.controller.inputs(), self.use_color));
            }
            Command::Help => println!("{}", view::help()),
            Command::Quit => return Flow::Quit,
            Command::Empty => {}
            Command::Unknown(input) => {
                println!("Comando desconhecido: {} (digite `ajuda`)", input);
            }
        }

        Flow::Continue
    }

    fn apply_pending_config(&mut self) {
        if let Some(config) = self.deferred_config.take() {
            if let Err(err) = self.apply_config_update(config) {
                error!("Failed to apply config update: {:#}", err);
            }
        }
    }

    fn apply_config_update(&mut self, new_config: Config) -> Result<()> {
        tracing::debug!(?new_config, "Apply config update requested");
        if new_config == self.current_config {
            tracing::debug!("Config unchanged; ignoring update");
            return Ok(());
        }

        if self.controller.is_loading() {
            warn!("Deferring config refresh until the current caption settles");
            self.deferred_config = Some(new_config);
            return Ok(());
        }

        if self.current_config.generator_changed(&new_config) {
            let generator = Self::build_generator(&self.api_key, &new_config)
                .context("Failed to reconfigure caption generator")?;
            info!(
                "🎯 Active generation backend: {} ({})",
                generator.name(),
                generator.model()
            );
            self.controller.replace_generator(Arc::new(generator))?;
        }

        if new_config.clipboard_enabled != self.current_config.clipboard_enabled {
            self.controller
                .set_clipboard(clipboard::from_config(new_config.clipboard_enabled));
        }

        self.controller.set_copy_feedback(new_config.copy_feedback());
        self.current_config = new_config;

        info!("Configuration updated");
        Ok(())
    }
}
