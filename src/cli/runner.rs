//! Runner wiring configuration, the sync engine and the image service

use crate::catalog::{
    AuxiliaryImages, BranchSelector, ComposeImageExtractor, LocalMirror, list_components,
};
use crate::cli::args::{Args, Command, OutputFormat};
use crate::config::AppConfig;
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use crate::registry::RegistryClient;
use crate::resolver::parse_release_version;
use crate::service::ImageService;
use crate::sync::{SyncEngine, SyncReport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Runner {
    args: Args,
    config: AppConfig,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let config = args.build_config()?;
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(config.verbose)
        };

        Ok(Self {
            args,
            config,
            output,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let service = self.build_service()?;

        match &self.args.command {
            Command::Tags => {
                self.sync_once(&service).await?;
                self.print_tags(&service)
            }
            Command::Analog { tag } => {
                self.sync_once(&service).await?;
                let analog = service.find_tag_analog(tag);
                match self.args.output {
                    OutputFormat::Json => self.emit_json(&serde_json::json!({
                        "tag": tag,
                        "analog": analog,
                    })),
                    OutputFormat::Text => {
                        println!("{}", analog);
                        Ok(())
                    }
                }
            }
            Command::Resolve { version, component } => {
                self.resolve(&service, version, component.as_deref()).await
            }
            Command::Images { tag } => {
                self.sync_once(&service).await?;
                let image_set = service.images_for_tag(tag).await?;
                if !image_set.unresolved.is_empty() {
                    self.output.warning(&format!(
                        "Unresolved components: {}",
                        image_set.unresolved.join(", ")
                    ));
                }
                match self.args.output {
                    OutputFormat::Json => self.emit_json(&image_set),
                    OutputFormat::Text => {
                        for image in &image_set.images {
                            println!("{}", image);
                        }
                        Ok(())
                    }
                }
            }
            Command::Watch { .. } => self.watch(service).await,
        }
    }

    fn build_service(&self) -> Result<ImageService> {
        let client = RegistryClient::new(self.config.registry.clone(), self.output.clone())?;
        let engine = Arc::new(SyncEngine::new(
            Arc::new(client),
            &self.config.sync,
            self.output.clone(),
        )?);
        if !self.config.auxiliary.is_enabled() {
            self.output
                .verbose("Auxiliary image lookup disabled: URL templates not configured");
        }
        let auxiliary = AuxiliaryImages::from_config(
            &self.config.auxiliary,
            self.config.registry.timeout(),
            self.output.clone(),
        )?;

        Ok(ImageService::new(
            engine,
            Arc::new(LocalMirror::new(&self.config.catalog.root, self.output.clone())),
            Arc::new(ComposeImageExtractor::new(self.output.clone())),
            BranchSelector::standard()?,
            self.output.clone(),
        )
        .with_auxiliary(auxiliary))
    }

    async fn sync_once(&self, service: &ImageService) -> Result<SyncReport> {
        self.output.subsection(&format!(
            "Indexing {}",
            self.config.registry.repository
        ));
        let report = service.engine().refresh().await;
        self.output.verbose(&format!(
            "{} tags indexed in {} batches",
            service.engine().tag_count(),
            report.batches
        ));
        if !report.published {
            return Err(ResolverError::Registry(format!(
                "Could not list tags of {}",
                self.config.registry.repository
            )));
        }
        Ok(report)
    }

    fn print_tags(&self, service: &ImageService) -> Result<()> {
        let snapshot = service.sync_snapshot();
        match self.args.output {
            OutputFormat::Json => self.emit_json(&snapshot),
            OutputFormat::Text => {
                for (tag, digest) in &snapshot {
                    println!("{}\t{}", tag, digest);
                }
                Ok(())
            }
        }
    }

    async fn resolve(&self, service: &ImageService, version: &str, component: Option<&str>) -> Result<()> {
        let version = parse_release_version(version)?;
        let mut resolution = service.resolve_release(&version).await?;

        if let Some(name) = component {
            resolution.components.retain(|c| c.component == name);
            resolution.unresolved.retain(|c| c == name);
            if resolution.components.is_empty() && resolution.unresolved.is_empty() {
                let known = list_components(&resolution.root)?.len();
                return Err(ResolverError::NotFound(format!(
                    "Component {} not found among {} components on branch {}",
                    name, known, resolution.branch
                )));
            }
        }

        match self.args.output {
            OutputFormat::Json => self.emit_json(&resolution),
            OutputFormat::Text => {
                self.output.summary_kv(
                    "Release",
                    &[
                        ("Version", version.to_string()),
                        ("Branch", resolution.branch.clone()),
                    ],
                );
                for selected in &resolution.components {
                    println!(
                        "{}\t{}\t{}",
                        selected.component,
                        selected.selection.name,
                        selected.selection.declared_version
                    );
                }
                for name in &resolution.unresolved {
                    println!("{}\t\t{}", name, crate::resolver::UNAVAILABLE);
                }
                Ok(())
            }
        }
    }

    async fn watch(&self, service: ImageService) -> Result<()> {
        let period = self.config.sync.interval();
        self.output.section("Watching registry");
        self.output.info(&format!(
            "Re-indexing {} every {}",
            self.config.registry.repository,
            self.output.format_duration(period)
        ));

        let initial = service.engine().refresh().await;
        self.output.info(&cycle_summary(&initial));

        let (tx, mut reports) = mpsc::unbounded_channel();
        let handle = Arc::clone(service.engine()).spawn_periodic(period, tx);

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    break;
                }
                report = reports.recv() => match report {
                    Some(report) => self.report_cycle(&service, &report),
                    None => break,
                },
            }
        }

        handle.abort();
        self.output.info("Stopped");
        Ok(())
    }

    fn report_cycle(&self, service: &ImageService, report: &SyncReport) {
        if !report.published {
            self.output.warning(&cycle_summary(report));
            return;
        }
        self.output.info(&cycle_summary(report));
        for tag in &report.changes.moved {
            self.output.info(&format!(
                "{} now points at {}",
                tag,
                service.find_tag_analog(tag)
            ));
        }
    }

    fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// One line per refresh cycle for `watch`
fn cycle_summary(report: &SyncReport) -> String {
    if !report.published {
        return "Tag list unavailable, index unchanged".to_string();
    }
    let changes = &report.changes;
    if changes.is_empty() {
        return format!("{} tags indexed, no changes", report.resolved);
    }
    format!(
        "{} tags indexed: +{} -{} ~{} ({})",
        report.resolved,
        changes.added.len(),
        changes.removed.len(),
        changes.moved.len(),
        changes
            .added
            .iter()
            .map(|t| format!("+{}", t))
            .chain(changes.removed.iter().map(|t| format!("-{}", t)))
            .chain(changes.moved.iter().map(|t| format!("~{}", t)))
            .collect::<Vec<_>>()
            .join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::IndexChanges;

    #[test]
    fn test_cycle_summary() {
        let mut report = SyncReport {
            published: true,
            resolved: 12,
            ..SyncReport::default()
        };
        assert_eq!(cycle_summary(&report), "12 tags indexed, no changes");

        report.changes = IndexChanges {
            added: vec!["v1.6.11".to_string()],
            removed: vec!["beta".to_string()],
            moved: vec!["latest".to_string(), "stable".to_string()],
        };
        assert_eq!(
            cycle_summary(&report),
            "12 tags indexed: +1 -1 ~2 (+v1.6.11 -beta ~latest ~stable)"
        );

        let failed = SyncReport::default();
        assert!(cycle_summary(&failed).contains("index unchanged"));
    }
}
