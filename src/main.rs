use clap::Parser;
use team_backfill::utils::{logger, validation::Validate};
use team_backfill::{
    BackfillEngine, BackfillError, CliConfig, ClientOptions, Configuration, GitHubClient,
    RunReport,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting team-backfill");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let exit_code = match run(&cli).await {
        Ok(report) => finish(&report, cli.json_report),
        Err(e) => {
            tracing::error!(category = ?e.category(), "❌ {}", e);
            eprintln!("❌ {}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

/// Fatal errors come back as `Err`; failed additions live in the report.
async fn run(cli: &CliConfig) -> Result<RunReport, BackfillError> {
    cli.validate()?;
    let config = Configuration::load(cli)?;

    let api_url = url::Url::parse(&cli.api_url)?;
    let client = GitHubClient::connect(&config.credential, ClientOptions::new(api_url))?;

    let engine = BackfillEngine::new(client).with_dry_run(cli.dry_run);
    engine.run(&config).await
}

fn finish(report: &RunReport, json_report: bool) -> i32 {
    if json_report {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "Failed serializing run report"),
        }
    }

    for failure in report.failures() {
        tracing::error!(
            team = %failure.team,
            member = %failure.member,
            "Failed adding user {} to team {}: {}",
            failure.member,
            failure.team,
            failure.message
        );
    }

    if report.is_success() {
        tracing::info!(
            org = %report.organization,
            teams = report.teams.len(),
            added = report.total_added(),
            dry_run = report.dry_run,
            "✅ Backfill completed"
        );
    } else {
        let failed = report.failures().count();
        tracing::error!(failed, "Failed adding users to team");
        eprintln!("❌ Failed adding {} user(s) to teams", failed);
    }

    report.exit_code()
}
