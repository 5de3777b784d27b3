use crate::infra::{configured_service, file_store, gate, pipeline};
use crate::preview::render_preview;
use clap::Args;
use insight_desk::config::AppConfig;
use insight_desk::error::AppError;
use insight_desk::workflows::editorial::drafts::{DraftInspection, NotificationOutcome};
use insight_desk::workflows::editorial::notify::Delivery;
use insight_desk::workflows::editorial::publish::PublishReport;
use insight_desk::workflows::editorial::{
    ApprovalOutcome, DraftRepository, DraftServiceError, NewDraft, Slug,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::warn;

const PREVIEW_CHARS: usize = 500;

#[derive(Args, Debug)]
pub(crate) struct CreateArgs {
    /// URL slug, e.g. best-schools-jakarta
    #[arg(long)]
    pub(crate) slug: String,
    /// Article title
    #[arg(long)]
    pub(crate) title: String,
    /// Article summary shown on the index page
    #[arg(long)]
    pub(crate) summary: String,
    /// Category label (GUIDE, FEES, RESULTS, ...)
    #[arg(long)]
    pub(crate) category: String,
    /// Article content as editor HTML
    #[arg(long)]
    pub(crate) content: String,
    /// Author name
    #[arg(long)]
    pub(crate) author: Option<String>,
    /// Comma-separated image URLs or image markers
    #[arg(long, value_delimiter = ',')]
    pub(crate) images: Vec<String>,
}

impl From<CreateArgs> for NewDraft {
    fn from(args: CreateArgs) -> Self {
        NewDraft {
            slug: args.slug,
            title: args.title,
            summary: args.summary,
            category: args.category,
            content: args.content,
            author: args.author,
            images: args.images,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct SlugArgs {
    /// Draft slug
    pub(crate) slug: String,
}

#[derive(Args, Debug)]
pub(crate) struct ApproveArgs {
    /// Draft slug
    pub(crate) slug: String,
    /// Name recorded as the reviewer
    #[arg(long)]
    pub(crate) reviewer: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// Draft slug
    pub(crate) slug: String,
    /// Where to write the HTML file
    #[arg(long, default_value = "draft-preview.html")]
    pub(crate) output: PathBuf,
}

fn parse_slug(raw: &str) -> Result<Slug, AppError> {
    Slug::parse(raw).map_err(|err| AppError::Drafts(err.into()))
}

pub(crate) fn run_create(config: &AppConfig, args: CreateArgs) -> Result<(), AppError> {
    let service = configured_service(config).map_err(DraftServiceError::from)?;
    let created = service.create(args.into())?;

    println!("Draft saved: {}", created.draft.slug());
    println!("  Status: {}", created.draft.status());
    println!("  Created: {}", created.draft.created_at().to_rfc3339());
    match &created.notification {
        NotificationOutcome::Sent => {
            println!("Review email sent to {}", config.review.review_email)
        }
        NotificationOutcome::Skipped(reason) => println!("Review email skipped: {reason}"),
        NotificationOutcome::Failed(reason) => {
            eprintln!("Failed to send review email: {reason}");
            eprintln!("  Draft saved but the reviewer was not notified");
        }
    }
    println!("\nReview URL: {}", created.review_url);
    Ok(())
}

pub(crate) fn run_list(config: &AppConfig) -> Result<(), AppError> {
    let store = file_store(config);
    let gate = gate(config);
    let listing = store
        .list()
        .map_err(|err| AppError::Drafts(err.into()))?;

    if listing.drafts.is_empty() {
        println!("No drafts in {}", store.drafts_dir().display());
    }
    for draft in &listing.drafts {
        let unresolved = gate.scan(draft).count();
        println!(
            "{:<40} {:<15} {:<12} {} unresolved",
            draft.slug().as_str(),
            draft.status().label(),
            draft.category(),
            unresolved
        );
    }
    for rejected in &listing.rejected {
        warn!(key = %rejected.key, reason = %rejected.reason, "unreadable draft record");
    }
    Ok(())
}

pub(crate) fn run_view(config: &AppConfig, args: SlugArgs) -> Result<(), AppError> {
    let slug = parse_slug(&args.slug)?;
    let service = configured_service(config).map_err(DraftServiceError::from)?;
    let inspection = service.inspect(&slug)?;
    print!("{}", render_view(&inspection, service.links().review_url(&slug).as_str()));
    Ok(())
}

pub(crate) fn render_view(inspection: &DraftInspection, review_url: &str) -> String {
    let draft = &inspection.draft;
    let rule = "=".repeat(80);
    let thin = "-".repeat(80);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}\nDRAFT: {}\n{rule}", draft.title());
    let _ = writeln!(out, "Slug: {}", draft.slug());
    let _ = writeln!(out, "Category: {}", draft.category());
    let _ = writeln!(out, "Author: {}", draft.author().unwrap_or("Not specified"));
    let _ = writeln!(out, "Status: {}", draft.status());
    let _ = writeln!(out, "Created: {}", draft.created_at().to_rfc3339());
    let _ = writeln!(out, "\nSummary:\n{}", draft.summary());

    let _ = writeln!(out, "\n{thin}");
    if inspection.report.is_clear() {
        let _ = writeln!(out, "No unresolved placeholders");
    } else {
        let _ = writeln!(
            out,
            "{} unresolved placeholder(s):",
            inspection.report.count()
        );
        for marker in inspection.report.markers() {
            let _ = writeln!(out, "  - {marker}");
        }
    }
    if inspection.report.excused_maps() > 0 {
        let _ = writeln!(
            out,
            "{} map marker(s) will resolve from MAPBOX_TOKEN",
            inspection.report.excused_maps()
        );
    }

    let content = draft.content();
    let preview: String = content.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if content.chars().count() > PREVIEW_CHARS {
        "..."
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "{thin}\nCONTENT PREVIEW (first {PREVIEW_CHARS} chars):\n{thin}\n{preview}{ellipsis}"
    );
    let _ = writeln!(out, "\n{rule}\nReview: {review_url}\n{rule}");
    out
}

pub(crate) fn run_approve(config: &AppConfig, args: ApproveArgs) -> Result<(), AppError> {
    let slug = parse_slug(&args.slug)?;
    let service = configured_service(config).map_err(DraftServiceError::from)?;
    let reviewer = args.reviewer.unwrap_or_default();

    match service.approve(&slug, &reviewer)? {
        ApprovalOutcome::Approved(draft) => {
            println!(
                "Approved {} (reviewed by {})",
                draft.slug(),
                draft.reviewed_by().unwrap_or_default()
            );
            println!("Run `insight-desk publish` to snapshot it for the site.");
            Ok(())
        }
        ApprovalOutcome::Blocked(report) => {
            eprintln!(
                "Cannot approve {slug}: {} unresolved placeholder(s)",
                report.count()
            );
            for marker in report.markers() {
                eprintln!("  - {marker}");
            }
            Err(AppError::Rejected(format!(
                "{} unresolved placeholder(s) remain",
                report.count()
            )))
        }
    }
}

pub(crate) fn run_publish(config: &AppConfig) -> Result<(), AppError> {
    let report = pipeline(config).run()?;
    print!("{}", render_publish_report(&report));
    Ok(())
}

pub(crate) fn render_publish_report(report: &PublishReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Published {} article(s), {} newly promoted",
        report.published_count(),
        report.promoted.len()
    );
    for slug in &report.held {
        let _ = writeln!(out, "  held: {slug} (previous snapshot kept)");
    }
    for skipped in &report.skipped {
        let _ = writeln!(out, "  skipped: {} ({})", skipped.key, skipped.reason);
    }
    let _ = writeln!(
        out,
        "Registry: {} entries; {} draft(s) awaiting approval",
        report.registry_len(),
        report.ineligible
    );
    out
}

pub(crate) fn run_notify(config: &AppConfig, args: SlugArgs) -> Result<(), AppError> {
    let slug = parse_slug(&args.slug)?;
    let service = configured_service(config).map_err(DraftServiceError::from)?;

    match service.resend_notification(&slug)? {
        Delivery::Sent { message_id } => println!(
            "Review email sent to {} ({})",
            config.review.review_email,
            message_id.as_deref().unwrap_or("no message id")
        ),
        Delivery::Skipped { reason } => println!("Review email skipped: {reason}"),
    }
    Ok(())
}

pub(crate) fn run_preview(config: &AppConfig, args: PreviewArgs) -> Result<(), AppError> {
    let slug = parse_slug(&args.slug)?;
    let service = configured_service(config).map_err(DraftServiceError::from)?;
    let inspection = service.inspect(&slug)?;

    std::fs::write(&args.output, render_preview(&inspection))?;
    println!("HTML preview written to {}", args.output.display());
    Ok(())
}
