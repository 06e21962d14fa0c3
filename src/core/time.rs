//! Calendar, time-scale and Greenwich hour angle helpers

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::types::{SarError, SarResult};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian day of J2000.0 (2000-01-01 12:00 UT)
const JD_J2000: f64 = 2_451_545.0;

/// TAI-UTC in seconds, effective from the given UTC date
const LEAP_SECONDS: [(i32, u32, u32, f64); 28] = [
    (1972, 1, 1, 10.0),
    (1972, 7, 1, 11.0),
    (1973, 1, 1, 12.0),
    (1974, 1, 1, 13.0),
    (1975, 1, 1, 14.0),
    (1976, 1, 1, 15.0),
    (1977, 1, 1, 16.0),
    (1978, 1, 1, 17.0),
    (1979, 1, 1, 18.0),
    (1980, 1, 1, 19.0),
    (1981, 7, 1, 20.0),
    (1982, 7, 1, 21.0),
    (1983, 7, 1, 22.0),
    (1985, 7, 1, 23.0),
    (1988, 1, 1, 24.0),
    (1990, 1, 1, 25.0),
    (1991, 1, 1, 26.0),
    (1992, 7, 1, 27.0),
    (1993, 7, 1, 28.0),
    (1994, 7, 1, 29.0),
    (1996, 1, 1, 30.0),
    (1997, 7, 1, 31.0),
    (1999, 1, 1, 32.0),
    (2006, 1, 1, 33.0),
    (2009, 1, 1, 34.0),
    (2012, 7, 1, 35.0),
    (2015, 7, 1, 36.0),
    (2017, 1, 1, 37.0),
];

/// Last date for which no leap second beyond the table had been announced
const LEAP_SECONDS_VALID_THROUGH: (i32, u32, u32) = (2026, 12, 31);

/// UT1-UTC in seconds at 0h UTC of the given date.
/// Nodes dated on a leap-second boundary carry the post-leap value.
const UT1_UTC: [(i32, u32, u32, f64); 26] = [
    (1992, 1, 1, -0.130),
    (1992, 7, 1, 0.520),
    (1993, 7, 1, 0.600),
    (1994, 7, 1, 0.790),
    (1995, 7, 1, -0.050),
    (1995, 11, 9, -0.315_146_1),
    (1995, 11, 10, -0.317_146_1),
    (1996, 1, 1, 0.550),
    (1997, 7, 1, 0.530),
    (1999, 1, 1, 0.720),
    (2000, 1, 1, 0.355),
    (2002, 1, 1, -0.115),
    (2003, 1, 1, -0.289_239_0),
    (2004, 1, 1, -0.390),
    (2004, 7, 1, -0.450),
    (2004, 12, 22, -0.500_670_7),
    (2004, 12, 23, -0.501_070_7),
    (2005, 7, 1, -0.600),
    (2006, 1, 1, 0.340),
    (2009, 1, 1, 0.410),
    (2012, 7, 1, 0.590),
    (2015, 7, 1, 0.680),
    (2017, 1, 1, 0.590),
    (2020, 1, 1, -0.180),
    (2022, 1, 1, -0.110),
    (2024, 1, 1, 0.010),
];

/// Gregorian leap-year rule
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Julian day at 0h UT on January 1st of `year`
pub fn julian_day_from_year(year: i32) -> f64 {
    let y = (year - 1) as i64;
    1_721_425.5 + (365 * y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)) as f64
}

/// Julian day at 0h UT of a calendar date
pub fn julian_day_from_ymd(year: i32, month: u32, day: u32) -> SarResult<f64> {
    let doy = day_of_year(year, month, day)?;
    Ok(julian_day_from_year(year) + (doy - 1) as f64)
}

/// Day of year (1-based) of a calendar date
pub fn day_of_year(year: i32, month: u32, day: u32) -> SarResult<u32> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.ordinal())
        .ok_or_else(|| SarError::Time(format!("Invalid date {}-{:02}-{:02}", year, month, day)))
}

/// Calendar (month, day) of a 1-based day of year
pub fn date_from_day_of_year(year: i32, julian_day: u32) -> SarResult<(u32, u32)> {
    NaiveDate::from_yo_opt(year, julian_day)
        .map(|d| (d.month(), d.day()))
        .ok_or_else(|| SarError::Time(format!("Invalid day of year {} in {}", julian_day, year)))
}

/// Julian date of an instant given as year, day of year and seconds of day
fn julian_date(year: i32, day: i32, sec: f64) -> f64 {
    julian_day_from_year(year) + (day - 1) as f64 + sec / SECONDS_PER_DAY
}

fn node_julian_day(year: i32, month: u32, day: u32) -> f64 {
    // Table dates are compile-time constants and always valid.
    julian_day_from_ymd(year, month, day).unwrap_or(f64::NAN)
}

fn tai_minus_utc(jd: f64) -> SarResult<f64> {
    let (y0, m0, d0, _) = LEAP_SECONDS[0];
    if jd < node_julian_day(y0, m0, d0) {
        return Err(SarError::Time(format!(
            "Date (JD {:.1}) precedes the leap-second table starting {}-{:02}-{:02}",
            jd, y0, m0, d0
        )));
    }
    let mut offset = LEAP_SECONDS[0].3;
    for &(y, m, d, value) in LEAP_SECONDS.iter() {
        if jd >= node_julian_day(y, m, d) {
            offset = value;
        } else {
            break;
        }
    }
    let (yv, mv, dv) = LEAP_SECONDS_VALID_THROUGH;
    if jd > node_julian_day(yv, mv, dv) {
        log::warn!(
            "Leap-second table is only known valid through {}-{:02}-{:02}; using TAI-UTC = {} for JD {:.1}",
            yv, mv, dv, offset, jd
        );
    }
    Ok(offset)
}

/// Convert UTC seconds-of-day to TAI seconds-of-day
#[allow(non_snake_case)]
pub fn TAI_from_UTC(year: i32, day: i32, sec: f64) -> SarResult<f64> {
    Ok(sec + tai_minus_utc(julian_date(year, day, sec))?)
}

/// Convert TAI seconds-of-day to UTC seconds-of-day
#[allow(non_snake_case)]
pub fn UTC_from_TAI(year: i32, day: i32, sec: f64) -> SarResult<f64> {
    Ok(sec - tai_minus_utc(julian_date(year, day, sec))?)
}

static UT1_TAI_NODES: OnceLock<SarResult<Vec<(f64, f64)>>> = OnceLock::new();

/// UT1-TAI at each UT1 table date, built on first use
fn ut1_tai_nodes() -> SarResult<&'static [(f64, f64)]> {
    UT1_TAI_NODES
        .get_or_init(|| {
            UT1_UTC
                .iter()
                .map(|&(y, m, d, value)| {
                    let node_jd = node_julian_day(y, m, d);
                    Ok((node_jd, value - tai_minus_utc(node_jd)?))
                })
                .collect()
        })
        .as_deref()
        .map_err(SarError::clone)
}

fn ut1_minus_utc(jd: f64) -> SarResult<f64> {
    let tai_utc = tai_minus_utc(jd)?;

    // Interpolate UT1-TAI, which is continuous across leap seconds.
    let nodes = ut1_tai_nodes()?;
    let first = nodes[0];
    let last = nodes[nodes.len() - 1];
    let ut1_tai = if jd <= first.0 {
        log::warn!("JD {:.1} precedes the UT1 table; clamping to first entry", jd);
        first.1
    } else if jd >= last.0 {
        if jd > last.0 + 366.0 {
            log::warn!("JD {:.1} is past the UT1 table; clamping to last entry", jd);
        }
        last.1
    } else {
        let idx = nodes.partition_point(|&(node_jd, _)| node_jd <= jd);
        let (j0, v0) = nodes[idx - 1];
        let (j1, v1) = nodes[idx];
        v0 + (v1 - v0) * (jd - j0) / (j1 - j0)
    };

    Ok(ut1_tai + tai_utc)
}

/// Convert UTC seconds-of-day to UT1 seconds-of-day
#[allow(non_snake_case)]
pub fn UT1_from_UTC(year: i32, day: i32, sec: f64) -> SarResult<f64> {
    Ok(sec + ut1_minus_utc(julian_date(year, day, sec))?)
}

/// Greenwich hour angle (apparent sidereal time) in degrees, in [0, 360)
pub fn utc2gha(year: i32, day: i32, hour: i32, min: i32, sec: f64) -> SarResult<f64> {
    let utc_sec = hour as f64 * 3600.0 + min as f64 * 60.0 + sec;
    let ut1_sec = UT1_from_UTC(year, day, utc_sec)?;

    let jd = julian_date(year, day, ut1_sec);
    let d = jd - JD_J2000;
    let t = d / 36_525.0;

    // Mean sidereal time (IAU 1982)
    let mut gha = 280.460_618_37 + 360.985_647_366_29 * d + t * t * (0.000_387_933 - t / 38_710_000.0);

    // Equation of the equinoxes
    let omega = (125.044_52 - 1_934.136_261 * t).to_radians();
    let l_sun = (280.466_5 + 36_000.769_8 * t).to_radians();
    let l_moon = (218.316_5 + 481_267.881_3 * t).to_radians();
    let dpsi = -17.20 * omega.sin() - 1.32 * (2.0 * l_sun).sin() - 0.23 * (2.0 * l_moon).sin()
        + 0.21 * (2.0 * omega).sin();
    let eps = (23.439_291 - 0.013_004_2 * t).to_radians();
    gha += dpsi * eps.cos() / 3600.0;

    Ok(gha.rem_euclid(360.0))
}

/// Greenwich hour angle of a UTC instant
pub fn gha_from_datetime(time: &DateTime<Utc>) -> SarResult<f64> {
    let sec = time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 * 1e-9;
    utc2gha(time.year(), time.ordinal() as i32, 0, 0, sec)
}

/// Add `seconds` to a (year, day-of-year, seconds-of-day) triple, carrying
/// across day and year boundaries
pub fn add_time(year: i32, day: i32, sec: f64, seconds: f64) -> (i32, i32, f64) {
    let mut year = year;
    let mut day = day;
    let mut sec = sec + seconds;
    while sec >= SECONDS_PER_DAY {
        sec -= SECONDS_PER_DAY;
        day += 1;
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if day > days_in_year {
            day = 1;
            year += 1;
        }
    }
    while sec < 0.0 {
        sec += SECONDS_PER_DAY;
        day -= 1;
        if day < 1 {
            year -= 1;
            day = if is_leap_year(year) { 366 } else { 365 };
        }
    }
    (year, day, sec)
}
