//! Archive request parameter bodies.

use serde_json::{json, Value};

use crate::plan::{BoundingBox, LevelKind, MonthlyRequest};

pub const MONTHLY_MEANS_DATASET: &str = "reanalysis-era5-single-levels-monthly-means";

const SURFACE_VARIABLES: [&str; 11] = [
    "geopotential",
    "2m_dewpoint_temperature",
    "surface_thermal_radiation_downwards",
    "surface_solar_radiation_downwards",
    "surface_pressure",
    "total_precipitation",
    "2m_temperature",
    "toa_incident_solar_radiation",
    "friction_velocity",
    "instantaneous_moisture_flux",
    "instantaneous_surface_sensible_heat_flux",
];

const PRESSURE_VARIABLES: [&str; 6] = [
    "geopotential",
    "temperature",
    "u_component_of_wind",
    "v_component_of_wind",
    "relative_humidity",
    "specific_humidity",
];

const GRID: [f64; 2] = [0.25, 0.25];

/// Parameter body for one monthly request.
pub fn body(request: &MonthlyRequest) -> Value {
    let variables = match request.kind {
        LevelKind::Surface => SURFACE_VARIABLES.as_slice(),
        LevelKind::Pressure => PRESSURE_VARIABLES.as_slice(),
    };

    let mut body = json!({
        "product_type": request.product.as_str(),
        "format": "netcdf",
        "area": request.bbox.area(),
        "variable": variables,
        "year": format!("{:04}", request.year),
        "month": format!("{:02}", request.month),
        "day": days(),
        "time": request.time_steps,
        "grid": GRID,
    });

    if let Some(levels) = &request.levels {
        body["pressure_level"] = json!(levels
            .iter()
            .map(|level| level.to_string())
            .collect::<Vec<_>>());
    }

    body
}

/// Parameter body for the monthly-means correction series: every month of
/// every year in `years`, one variable.
pub fn monthly_means_body(years: &[i32], bbox: &BoundingBox) -> Value {
    json!({
        "product_type": "monthly_averaged_reanalysis",
        "format": "netcdf",
        "area": bbox.area(),
        "variable": "total_precipitation",
        "year": years.iter().map(|year| year.to_string()).collect::<Vec<_>>(),
        "month": (1..=12).map(|month| format!("{month:02}")).collect::<Vec<_>>(),
        "time": "00:00",
        "grid": GRID,
    })
}

// Every month is requested with all 31 days; the archive drops the dates
// that do not exist in the month.
fn days() -> Vec<String> {
    (1..=31).map(|day| format!("{day:02}")).collect()
}

// -- Tests -------------------------------------------------------------------
