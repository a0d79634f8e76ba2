use anyhow::Result;

use crate::cli::{create_spinner, MergeArgs};
use crate::merge::Strategy;

pub fn merge(args: &MergeArgs) -> Result<()> {
    let strategy = if args.record_dim {
        Strategy::FiveDimensional
    } else {
        Strategy::Simple
    };

    let bar = create_spinner(format!("Merging {}* files...", args.prefix));
    crate::merge::merge(&args.dir, &args.prefix, strategy)?;
    bar.finish_with_message("Merge complete");

    println!(
        "File saved to `{}`",
        args.dir.join(format!("{}.nc", args.prefix)).display()
    );

    Ok(())
}
