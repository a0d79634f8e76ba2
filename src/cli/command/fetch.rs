use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Result;

use crate::{
    cds::{CdsClient, Credentials, Retrieve},
    cli::FetchArgs,
    error::Era5Error,
    fetch, inventory,
    plan::{self, LevelKind, TimeStep},
};

pub async fn fetch(args: &FetchArgs) -> Result<()> {
    let kind: LevelKind = args.kind.parse()?;
    let step = TimeStep::new(args.step)?;
    let bbox = args.bbox.bounding_box();

    println!();
    println!("---> Loading ERA5 {} climate forcing", args.kind);

    let plan = plan::build_plan(
        args.start,
        args.end,
        &args.dir,
        bbox,
        step,
        args.product,
        kind,
        args.levels.clone(),
    )?;
    if plan.is_empty() {
        println!(
            "No whole calendar month falls between {} and {}",
            args.start, args.end
        );
        return Ok(());
    }
    print_span(&plan);

    let (satisfied, pending) = inventory::partition_existing(plan);
    inventory::report(kind, &satisfied, &pending);

    if pending.is_empty() {
        println!("All monthly files already on disk");
        return Ok(());
    }

    if !confirmed(args.yes, pending.len())? {
        return Err(Era5Error::Declined.into());
    }

    let credentials = Credentials::discover()?;
    let client: Arc<dyn Retrieve> = Arc::new(CdsClient::new(credentials));
    fetch::run(pending, client, args.concurrency).await?;

    Ok(())
}

fn print_span(plan: &[plan::MonthlyRequest]) {
    let first = &plan[0];
    let last = &plan[plan.len() - 1];
    println!("Start = {:04}-{:02}", first.year, first.month);
    println!("End = {:04}-{:02}", last.year, last.month);
}

// The gate before any network activity: skipped with --yes, otherwise an
// interactive prompt. A non-terminal stdin without --yes declines.
fn confirmed(auto: bool, pending: usize) -> Result<bool> {
    if auto {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        eprintln!("stdin is not a terminal; pass --yes to fetch without a prompt");
        return Ok(false);
    }

    print!("---> Download {pending} missing file(s)? (y/n) ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();

    answer.eq_ignore_ascii_case("y") || answer == "1"
}

// -- Tests -------------------------------------------------------------------
