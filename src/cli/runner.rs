//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::ConverterConfig;
use crate::error::{Error, Result};
use crate::invocation::{self, InvocationEvent};
use crate::storage::{BlobLister, BlobStore};
use futures::TryStreamExt;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { event, event_json } => {
                self.convert(event.as_deref(), event_json.as_deref()).await
            }
            Commands::List { limit } => self.list(*limit).await,
            Commands::Validate => self.validate(),
            Commands::Serve { port } => {
                let config = crate::cli::ServerConfig {
                    converter: self.load_config()?,
                };
                crate::cli::serve(config, *port).await
            }
        }
    }

    /// Load the config file and apply command-line overrides
    pub fn load_config(&self) -> Result<ConverterConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ConverterConfig::from_file(path)?,
            None => {
                let source = self.cli.source.clone().ok_or_else(|| {
                    Error::config("No configuration given (use --config or --source/--destination)")
                })?;
                let destination = self
                    .cli
                    .destination
                    .clone()
                    .ok_or_else(|| Error::missing_field("destination.url"))?;
                ConverterConfig::new(source, destination)
            }
        };

        if let Some(source) = &self.cli.source {
            config.source.url.clone_from(source);
        }
        if let Some(destination) = &self.cli.destination {
            config.destination.url.clone_from(destination);
        }
        if let Some(size) = self.cli.batch_size {
            config.batch.size = size;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load the trigger event from a file or inline JSON
    fn load_event(&self, path: Option<&Path>, inline: Option<&str>) -> Result<InvocationEvent> {
        let event = if let Some(json) = inline {
            InvocationEvent::from_json_str(json)?
        } else if let Some(path) = path {
            let content = fs::read_to_string(path).map_err(|_| Error::FileNotFound {
                path: path.display().to_string(),
            })?;
            InvocationEvent::from_json_str(&content)?
        } else {
            InvocationEvent::default()
        };

        if self.cli.verbose && !event.is_verbose() {
            return Ok(InvocationEvent::verbose(true));
        }
        Ok(event)
    }

    /// Run one pass
    async fn convert(&self, event: Option<&Path>, event_json: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let event = self.load_event(event, event_json)?;

        let response = invocation::handle(&event, config).await?;
        self.output_message(&serde_json::to_value(&response)?);
        Ok(())
    }

    /// Print the source keys
    async fn list(&self, limit: Option<usize>) -> Result<()> {
        let config = self.load_config()?;
        let store = BlobStore::parse(&config.source.url, config.source.region.as_deref())?;
        let lister = BlobLister::from_config(store, &config.source);

        let mut keys = lister.keys();
        let mut count = 0;
        while let Some(key) = keys.try_next().await? {
            println!("{key}");
            count += 1;
            if limit.is_some_and(|limit| count >= limit) {
                break;
            }
        }

        tracing::info!("Listed {count} keys from {}", lister.store());
        Ok(())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        tracing::info!("Configuration is valid");
        self.output_message(&validation_report(&config));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        if self.cli.verbose {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}

/// Status object printed by `validate`
fn validation_report(config: &ConverterConfig) -> Value {
    json!({
        "valid": true,
        "source": config.source.url,
        "destination": config.destination.url,
        "batch_size": config.batch.size,
        "listing": config.batch.listing,
    })
}
