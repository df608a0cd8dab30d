//! Build automation tasks for Phonedesk
//!
//! Currently generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for Phonedesk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<phonedesk_ingest::Cli>();

    let content = format!(
        r#"# Phonedesk CLI Reference

This documentation is generated from the CLI source code. Last updated: {}.

## Overview

`phonedesk` reads phone equipment requests from a PostgreSQL table and files
each distinct request once as a service desk ticket. Fingerprints of filed
requests are kept in a JSON store so reruns only file new rows.

## Quick Start

```bash
# Check the source connection and see how many rows are pending
phonedesk check

# Preview what would be filed
phonedesk run --dry-run

# File tickets
phonedesk run

# Inspect the fingerprint store
phonedesk store show
```

## Commands

{}

## Environment Variables

| Variable | Default | Purpose |
|----------|---------|---------|
| `DB_CREDENTIALS` | `postgresql://localhost/phonedesk` | Source connection string |
| `PHONEDESK_SOURCE_TABLE` | `phonerequest` | Source table, optionally schema-qualified |
| `PHONEDESK_SOURCE_ORDER_BY` | `id` | Stable ordering column |
| `PHONEDESK_CONNECT_TIMEOUT_SECS` | `10` | Database connect timeout |
| `PHONEDESK_FETCH_TIMEOUT_SECS` | `60` | Page fetch timeout |
| `JIRA_URL` | | Service desk site URL |
| `JIRA_EMAIL` | | API user |
| `JIRA_API_TOKEN` | | API token |
| `SERVICE_DESK_ID` | | Target service desk |
| `REQUEST_TYPE_ID` | | Request type of the phone equipment form |
| `PHONEDESK_SUBMIT_TIMEOUT_SECS` | `30` | Per-ticket timeout |
| `PHONEDESK_STORE_PATH` | `phonedesk-fingerprints.json` | Fingerprint store file |
| `PHONEDESK_PAGE_SIZE` | `1000` | Rows per page |
| `PHONEDESK_SUBMIT_MAX_ATTEMPTS` | `1` | Attempts per ticket on transport errors |
| `PHONEDESK_RETRY_BASE_DELAY_MS` | `500` | First retry delay, doubled per attempt |
| `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR` | | Logging overrides |

A `.env` file in the working directory is loaded on startup.

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
