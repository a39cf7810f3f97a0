//! Built-in migration steps.
//!
//! These check the export and the run options before any content is touched.
//! Each step reports everything it finds instead of stopping at the first
//! problem, so a single run shows the full list of things to fix.

use super::runner::{MigrationContext, Step};
use crate::errors::{Failure, ImportError};
use crate::models::SourceKind;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use tracing::debug;
use walkdir::WalkDir;

/// Date formats accepted for `--posts-before` / `--posts-after`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d %Y", "%B %d, %Y", "%b %d %Y", "%d %B %Y"];

/// Checks that the export file exists and looks like the right format.
pub struct CheckExport;

impl Step for CheckExport {
    fn title(&self) -> &str {
        "Checking export file"
    }

    fn run(&self, ctx: &mut MigrationContext) -> Result<(), Failure> {
        let path = &ctx.input;

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ImportError::fatal("Export file not found")
                    .with_context(path.display())
                    .into());
            }
            Err(e) => {
                return Err(ImportError::fatal("Cannot read export file")
                    .with_context(path.display())
                    .with_source(e)
                    .into());
            }
        };

        if metadata.is_dir() {
            return Err(ImportError::fatal("Export path is a directory, expected a file")
                .with_context(path.display())
                .into());
        }

        if metadata.len() == 0 {
            return Err(ImportError::fatal("Export file is empty")
                .with_context(path.display())
                .into());
        }

        let expected = ctx.source.expected_extension();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        if extension.as_deref() != Some(expected) {
            let warning = ImportError::warning(format!(
                "{} exports are usually .{} files",
                ctx.source, expected
            ))
            .with_context(path.display());
            ctx.errors.add(warning);
        }

        debug!("Export file is {} bytes", metadata.len());
        Ok(())
    }
}

/// Validates the run options and fills in the values derived from them.
pub struct ValidateOptions;

impl Step for ValidateOptions {
    fn title(&self) -> &str {
        "Validating options"
    }

    fn run(&self, ctx: &mut MigrationContext) -> Result<(), Failure> {
        if ctx.source == SourceKind::Substack {
            validate_url(ctx);
            validate_email(ctx);
            validate_date_window(ctx);
            validate_subscribe_link(ctx);
        }

        if ctx.options.scrape.scrapes_web() && ctx.options.wait_after_scrape_ms == 0 {
            ctx.errors.add(ImportError::warning(
                "Scraping without a wait between requests may get rate limited",
            ));
        }

        Ok(())
    }
}

fn validate_url(ctx: &mut MigrationContext) {
    let url = ctx.options.url.trim();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        ctx.errors.add(
            ImportError::fatal("Site URL must start with 'http://' or 'https://'")
                .with_context(&ctx.options.url),
        );
        return;
    }

    if url.ends_with('/') {
        let trimmed = url.trim_end_matches('/').to_string();
        ctx.errors.add(
            ImportError::warning("Removed trailing slash from site URL")
                .with_context(&trimmed),
        );
        ctx.options.url = trimmed;
    } else if url.len() != ctx.options.url.len() {
        ctx.options.url = url.to_string();
    }
}

fn validate_email(ctx: &mut MigrationContext) {
    let Some(email) = ctx.options.email.as_deref() else {
        return;
    };

    match author_slug(email) {
        Some(slug) => ctx.options.author_slug = Some(slug),
        None => ctx
            .errors
            .add(ImportError::fatal("Invalid email for the general user").with_context(email)),
    }
}

/// Slug for the general user, taken from the email's local part.
///
/// `john@mycompany.com` becomes `john`. Returns `None` if the address is not
/// of the form `local@domain.tld`.
pub fn author_slug(email: &str) -> Option<String> {
    let (local, domain) = email.trim().split_once('@')?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return None;
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }

    let mut slug = String::with_capacity(local.len());
    for c in local.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

fn validate_date_window(ctx: &mut MigrationContext) {
    let mut check = |raw: Option<String>, flag: &str| -> Option<NaiveDate> {
        let raw = raw?;
        match parse_post_date(&raw) {
            Some(date) => Some(date),
            None => {
                ctx.errors.add(
                    ImportError::fatal(format!("Unrecognised date for --{}", flag))
                        .with_context(&raw),
                );
                None
            }
        }
    };

    let after = check(ctx.options.posts_after.clone(), "posts-after");
    let before = check(ctx.options.posts_before.clone(), "posts-before");

    ctx.options.window.after = after;
    ctx.options.window.before = before;

    if ctx.options.window.is_inverted() {
        ctx.errors.add(ImportError::fatal(
            "--posts-after is later than --posts-before, no posts would be migrated",
        ));
    }
}

/// Parse a date given on the command line, e.g. `March 20 2018` or `2018-03-20`.
pub fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn validate_subscribe_link(ctx: &mut MigrationContext) {
    let Some(link) = ctx.options.subscribe_link.as_deref() else {
        return;
    };

    let looks_valid = link.starts_with('/') || link.starts_with('#') || link.starts_with("http");
    if !looks_valid {
        ctx.errors.add(
            ImportError::warning("Subscribe link should be a path, an anchor or a URL")
                .with_context(link),
        );
    }
}

/// Collects the HTML post files from the posts directory.
pub struct ScanPostsDir;

impl Step for ScanPostsDir {
    fn title(&self) -> &str {
        "Scanning posts directory"
    }

    fn enabled(&self, ctx: &MigrationContext) -> bool {
        ctx.options.posts_dir.is_some()
    }

    fn run(&self, ctx: &mut MigrationContext) -> Result<(), Failure> {
        let Some(dir) = ctx.options.posts_dir.clone() else {
            return Ok(());
        };

        if !dir.is_dir() {
            return Err(ImportError::fatal("Posts directory not found")
                .with_context(dir.display())
                .into());
        }

        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                continue;
            }

            let is_html = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html"));

            if is_html {
                ctx.post_files.push(entry.into_path());
            } else {
                ctx.errors.add(
                    ImportError::warning("Ignoring non-HTML file in posts directory")
                        .with_context(entry.path().display()),
                );
            }
        }

        if ctx.post_files.is_empty() {
            ctx.errors.add(
                ImportError::warning("No HTML files found in posts directory")
                    .with_context(dir.display()),
            );
        }

        debug!("Found {} post files", ctx.post_files.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MigrationOptions, ScrapeMode};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn substack(input: PathBuf) -> MigrationContext {
        MigrationContext::new(
            SourceKind::Substack,
            input,
            MigrationOptions {
                url: "https://example.substack.com".to_string(),
                scrape: ScrapeMode::None,
                wait_after_scrape_ms: 2000,
                ..MigrationOptions::default()
            },
        )
    }

    fn messages(ctx: &MigrationContext) -> Vec<String> {
        ctx.errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_check_export_missing() {
        let dir = TempDir::new().unwrap();
        let mut ctx = substack(dir.path().join("missing.csv"));

        let err = CheckExport.run(&mut ctx).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("Export file not found"));
    }

    #[test]
    fn test_check_export_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.csv");
        fs::write(&path, "").unwrap();
        let mut ctx = substack(path);

        let err = CheckExport.run(&mut ctx).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_check_export_directory() {
        let dir = TempDir::new().unwrap();
        let mut ctx = substack(dir.path().to_path_buf());

        let err = CheckExport.run(&mut ctx).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_check_export_wrong_extension_warns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.txt");
        fs::write(&path, "post_id,title\n").unwrap();
        let mut ctx = substack(path);

        assert!(CheckExport.run(&mut ctx).is_ok());
        assert_eq!(ctx.errors.len(), 1);
        assert!(!ctx.errors.is_fatal());
        assert!(messages(&ctx)[0].contains(".csv"));
    }

    #[test]
    fn test_check_export_ok() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.CSV");
        fs::write(&path, "post_id,title\n").unwrap();
        let mut ctx = substack(path);

        assert!(CheckExport.run(&mut ctx).is_ok());
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn test_validate_trims_trailing_slash() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.url = "https://example.substack.com/".to_string();

        ValidateOptions.run(&mut ctx).unwrap();
        assert_eq!(ctx.options.url, "https://example.substack.com");
        assert_eq!(ctx.errors.len(), 1);
        assert!(!ctx.errors.is_fatal());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.url = "example.substack.com".to_string();

        ValidateOptions.run(&mut ctx).unwrap();
        assert!(ctx.errors.is_fatal());
    }

    #[test]
    fn test_validate_email_sets_author_slug() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.email = Some("john@mycompany.com".to_string());

        ValidateOptions.run(&mut ctx).unwrap();
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.options.author_slug.as_deref(), Some("john"));
    }

    #[test]
    fn test_validate_bad_email_is_fatal() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.email = Some("john".to_string());

        ValidateOptions.run(&mut ctx).unwrap();
        assert!(ctx.errors.is_fatal());
        assert!(ctx.options.author_slug.is_none());
    }

    #[test]
    fn test_author_slug() {
        assert_eq!(author_slug("John.Smith@example.com").as_deref(), Some("john-smith"));
        assert_eq!(author_slug("  jane@example.org ").as_deref(), Some("jane"));
        assert_eq!(author_slug("@example.com"), None);
        assert_eq!(author_slug("jane@localhost"), None);
        assert_eq!(author_slug("a@b@c.com"), None);
        assert_eq!(author_slug("__@example.com"), None);
    }

    #[test]
    fn test_parse_post_date() {
        let expected = NaiveDate::from_ymd_opt(2018, 3, 20).unwrap();
        assert_eq!(parse_post_date("March 20 2018"), Some(expected));
        assert_eq!(parse_post_date("March 20, 2018"), Some(expected));
        assert_eq!(parse_post_date("Mar 20 2018"), Some(expected));
        assert_eq!(parse_post_date("20 March 2018"), Some(expected));
        assert_eq!(parse_post_date("2018-03-20"), Some(expected));
        assert_eq!(parse_post_date("next tuesday"), None);
    }

    #[test]
    fn test_validate_date_window() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.posts_after = Some("August 16 2021".to_string());
        ctx.options.posts_before = Some("2022-03-20".to_string());

        ValidateOptions.run(&mut ctx).unwrap();
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.options.window.after, NaiveDate::from_ymd_opt(2021, 8, 16));
        assert_eq!(ctx.options.window.before, NaiveDate::from_ymd_opt(2022, 3, 20));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.url = "ftp://example.com".to_string();
        ctx.options.email = Some("not-an-email".to_string());
        ctx.options.posts_after = Some("someday".to_string());
        ctx.options.subscribe_link = Some("join-us".to_string());

        ValidateOptions.run(&mut ctx).unwrap();
        assert_eq!(ctx.errors.len(), 4);
        assert!(ctx.errors.render().starts_with("Multiple errors:"));
    }

    #[test]
    fn test_validate_inverted_window() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.posts_after = Some("2022-03-20".to_string());
        ctx.options.posts_before = Some("2021-08-16".to_string());

        ValidateOptions.run(&mut ctx).unwrap();
        assert_eq!(ctx.errors.len(), 1);
        assert!(ctx.errors.is_fatal());
    }

    #[test]
    fn test_validate_zero_wait_warns_when_scraping_web() {
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.scrape = ScrapeMode::Web;
        ctx.options.wait_after_scrape_ms = 0;

        ValidateOptions.run(&mut ctx).unwrap();
        assert_eq!(ctx.errors.len(), 1);
        assert!(!ctx.errors.is_fatal());

        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.scrape = ScrapeMode::Img;
        ctx.options.wait_after_scrape_ms = 0;

        ValidateOptions.run(&mut ctx).unwrap();
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn test_validate_medium_ignores_substack_options() {
        let mut ctx = MigrationContext::new(
            SourceKind::Medium,
            PathBuf::from("export.zip"),
            MigrationOptions {
                scrape: ScrapeMode::None,
                ..MigrationOptions::default()
            },
        );

        ValidateOptions.run(&mut ctx).unwrap();
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn test_scan_posts_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("101.html"), "<p>one</p>").unwrap();
        fs::write(dir.path().join("102.HTML"), "<p>two</p>").unwrap();
        fs::write(dir.path().join("notes.txt"), "todo").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();

        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.posts_dir = Some(dir.path().to_path_buf());

        assert!(ScanPostsDir.enabled(&ctx));
        ScanPostsDir.run(&mut ctx).unwrap();

        assert_eq!(ctx.post_files.len(), 2);
        assert_eq!(ctx.errors.len(), 1);
        assert!(messages(&ctx)[0].contains("notes.txt"));
    }

    #[test]
    fn test_scan_posts_dir_without_html_warns() {
        let dir = TempDir::new().unwrap();
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.posts_dir = Some(dir.path().to_path_buf());

        ScanPostsDir.run(&mut ctx).unwrap();
        assert!(ctx.post_files.is_empty());
        assert_eq!(ctx.errors.len(), 1);
        assert!(!ctx.errors.is_fatal());
    }

    #[test]
    fn test_scan_posts_dir_missing() {
        let dir = TempDir::new().unwrap();
        let mut ctx = substack(PathBuf::from("posts.csv"));
        ctx.options.posts_dir = Some(dir.path().join("nope"));

        let err = ScanPostsDir.run(&mut ctx).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_scan_posts_dir_disabled_without_option() {
        let ctx = substack(PathBuf::from("posts.csv"));
        assert!(!ScanPostsDir.enabled(&ctx));
    }
}
