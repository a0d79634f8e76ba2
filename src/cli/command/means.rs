use anyhow::Result;
use chrono::{Datelike, Months, NaiveDate};

use crate::{
    cds::{CdsClient, Credentials, Retrieve},
    cli::{create_spinner, MeansArgs},
    request,
};

/// Fetches the monthly-means precipitation series used by the downstream
/// bias correction. One unconditional request, no existence check.
pub async fn means(args: &MeansArgs) -> Result<()> {
    let years = spanned_years(args.start, args.end);
    let bbox = args.bbox.bounding_box();
    let target = args.dir.join("tpmm.nc");

    let credentials = Credentials::discover()?;
    let client = CdsClient::new(credentials);

    let bar = create_spinner("Fetching monthly means...".to_string());
    let body = request::monthly_means_body(&years, &bbox);
    client
        .retrieve(request::MONTHLY_MEANS_DATASET, &body, &target)
        .await?;
    bar.finish_with_message("Monthly means downloaded");

    println!("{} complete", target.display());

    Ok(())
}

// Distinct calendar years covered once the range is padded by one month
// on each side.
fn spanned_years(start: NaiveDate, end: NaiveDate) -> Vec<i32> {
    let padded_start = start.checked_sub_months(Months::new(1)).unwrap_or(start);
    let padded_end = end.checked_add_months(Months::new(1)).unwrap_or(end);

    (padded_start.year()..=padded_end.year()).collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn should_span_a_single_year() {
        assert_eq!(
            spanned_years(date(2020, 3, 1), date(2020, 8, 31)),
            vec![2020]
        );
    }

    #[test]
    fn should_span_years_across_a_boundary() {
        assert_eq!(
            spanned_years(date(2019, 12, 15), date(2020, 1, 10)),
            vec![2019, 2020]
        );
    }

    #[test]
    fn should_pull_in_years_through_the_padding() {
        // January start pads back into the previous December; December
        // end pads forward into the next January.
        assert_eq!(
            spanned_years(date(2020, 1, 10), date(2020, 12, 20)),
            vec![2019, 2020, 2021]
        );
    }
}
