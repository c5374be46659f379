//! Command handlers.
//!
//! Each invocation is one short session: the wizard is built, the
//! remembered draft (if any) is fetched, the command runs against it and
//! the result is rendered as markdown.

use std::{fs, path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use log::debug;
use propwiz_core::{
    gateway::MemoryGateway, DraftId, OperationStatus, SectionKind, SessionStore, Wizard,
    WizardBuilder, WizardError,
};
use serde_json::{json, Value};

use crate::{
    args::{Commands, SaveArgs},
    renderer::TerminalRenderer,
};

pub struct Cli {
    wizard: Wizard,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(wizard: Wizard, renderer: TerminalRenderer) -> Self {
        Self { wizard, renderer }
    }

    /// Loads the bound draft, if there is one.
    async fn sync(&mut self) -> Result<()> {
        if self.wizard.draft_id().is_some() {
            self.wizard
                .fetch_aggregate()
                .await
                .context("Failed to load the property draft")?;
        }
        Ok(())
    }

    pub async fn handle_command(mut self, command: Commands) -> Result<()> {
        self.sync().await?;
        match command {
            Commands::Status => self.status(),
            Commands::Show { section } => self.show(section),
            Commands::Save(args) => self.save(args).await?,
            Commands::Next => {
                let navigation = self.wizard.next().await?;
                self.finish_navigation(&navigation.to_string(), navigation.is_blocked())?;
            }
            Commands::Goto { step } => {
                let navigation = self.wizard.select_step(step).await?;
                self.finish_navigation(&navigation.to_string(), navigation.is_blocked())?;
            }
            Commands::Session { .. } | Commands::Demo => {
                bail!("this command does not run against the listings API")
            }
        }
        Ok(())
    }

    fn status(&self) {
        self.renderer.render(&self.wizard.overview().to_string());
    }

    fn show(&self, section: SectionKind) {
        self.renderer
            .render(&self.wizard.section_view(section).to_string());
    }

    fn finish_navigation(&self, message: &str, blocked: bool) -> Result<()> {
        if blocked {
            bail!("{message}");
        }
        self.renderer.render(message);
        self.renderer.render(&self.wizard.active_view().to_string());
        Ok(())
    }

    async fn save(&mut self, args: SaveArgs) -> Result<()> {
        let SaveArgs {
            section,
            file,
            assignments,
        } = args;

        if let Some(path) = file {
            self.wizard.replace(section, read_payload(&path)?)?;
        }
        for (path, value) in assignments {
            debug!("Setting {section} field {path}");
            self.wizard.edit(section, &path, value)?;
        }

        match self.wizard.save_section(section).await {
            Ok(receipt) => {
                self.renderer.render(&receipt.to_string());
                Ok(())
            }
            Err(WizardError::NoChanges { section }) => {
                let status = OperationStatus::failure(format!("No changes to save in {section}"));
                self.renderer.render(&status.to_string());
                Ok(())
            }
            Err(e) => {
                self.renderer
                    .render_error(&self.wizard.section_view(section).to_string());
                Err(e).with_context(|| format!("Failed to save {section}"))
            }
        }
    }
}

fn read_payload(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// `session show` and `session clear` work on the pointer alone.
pub struct SessionCli {
    store: SessionStore,
    renderer: TerminalRenderer,
}

impl SessionCli {
    pub fn new(store: SessionStore, renderer: TerminalRenderer) -> Self {
        Self { store, renderer }
    }

    pub async fn show(&self) -> Result<()> {
        match self.store.load().await? {
            Some(stored) => self.renderer.render(&stored.to_string()),
            None => self.renderer.render("No unfinished listing.\n"),
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let status = if self.store.clear().await? {
            OperationStatus::success("Forgot the unfinished listing".to_string())
        } else {
            OperationStatus::failure("No unfinished listing to forget".to_string())
        };
        self.renderer.render(&status.to_string());
        Ok(())
    }
}

/// Parses a draft id given on the command line.
pub fn parse_draft_id(raw: &str) -> Result<DraftId> {
    DraftId::new(raw).context("Invalid draft id")
}

/// Walks the first two steps of a sample listing against an in-memory API,
/// printing each stage.
pub async fn run_demo(renderer: &TerminalRenderer) -> Result<()> {
    let mut wizard = WizardBuilder::new()
        .with_gateway(Arc::new(MemoryGateway::new()))
        .without_session_store()
        .build()
        .await
        .context("Failed to start the demo wizard")?;

    renderer.render(&wizard.overview().to_string());

    wizard.edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))?;
    wizard.edit(SectionKind::GeneralDetails, "property_type", json!("Office"))?;
    wizard.edit(SectionKind::GeneralDetails, "size_sq_ft", json!("1200"))?;
    renderer.render(&wizard.save_section(SectionKind::GeneralDetails).await?.to_string());

    match wizard.save_section(SectionKind::GeneralDetails).await {
        Err(e @ WizardError::NoChanges { .. }) => {
            renderer.render(&OperationStatus::failure(e.to_string()).to_string())
        }
        other => bail!("expected an unchanged section to be refused, got {other:?}"),
    }

    wizard.push_item(
        SectionKind::BusinessDetails,
        "sale_types",
        json!({ "sale_type": "Freehold", "price_value": 250000 }),
    )?;
    renderer.render(&wizard.save_section(SectionKind::BusinessDetails).await?.to_string());

    let jump = wizard.select_step(SectionKind::Documents.index()).await?;
    renderer.render(&format!("{jump}\n"));

    renderer.render(&wizard.overview().to_string());
    Ok(())
}
