//! Python bindings

use ndarray::Array1;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::core::time;
use crate::projection::{
    MapProjector, PolarStereographic, PolarStereographicParameters, Utm, UtmParameters,
};
use crate::types::{Ellipsoid, Hemisphere, SarError};

fn to_py_err(e: SarError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e))
}

/// Python module definition
#[pymodule]
fn sargeo(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(utc2gha, m)?)?;
    m.add_function(wrap_pyfunction!(julian_day, m)?)?;
    m.add_function(wrap_pyfunction!(tai_from_utc, m)?)?;
    m.add_function(wrap_pyfunction!(utm_forward, m)?)?;
    m.add_function(wrap_pyfunction!(utm_inverse, m)?)?;
    m.add_function(wrap_pyfunction!(polar_stereographic_forward, m)?)?;
    m.add_function(wrap_pyfunction!(polar_stereographic_inverse, m)?)?;
    Ok(())
}

/// Greenwich hour angle in degrees
#[pyfunction]
fn utc2gha(year: i32, day: i32, hour: i32, min: i32, sec: f64) -> PyResult<f64> {
    time::utc2gha(year, day, hour, min, sec).map_err(to_py_err)
}

/// Julian day at 0h UT on January 1st of `year`
#[pyfunction]
fn julian_day(year: i32) -> f64 {
    time::julian_day_from_year(year)
}

/// TAI seconds of day for a UTC instant
#[pyfunction]
fn tai_from_utc(year: i32, day: i32, sec: f64) -> PyResult<f64> {
    time::TAI_from_UTC(year, day, sec).map_err(to_py_err)
}

fn utm(zone: i32, south: bool) -> PyResult<Utm> {
    let hemisphere = if south { Hemisphere::South } else { Hemisphere::North };
    Utm::new(&UtmParameters::new(zone, hemisphere), &Ellipsoid::wgs84()).map_err(to_py_err)
}

fn apply<'py>(
    py: Python<'py>,
    projector: &dyn MapProjector,
    a: PyReadonlyArray1<f64>,
    b: PyReadonlyArray1<f64>,
    inverse: bool,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let a = a.as_array();
    let b = b.as_array();
    if a.len() != b.len() {
        return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Coordinate arrays differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    let mut out_a = Array1::<f64>::zeros(a.len());
    let mut out_b = Array1::<f64>::zeros(a.len());
    for i in 0..a.len() {
        let (p, q) = if inverse {
            projector.inverse(a[i], b[i])
        } else {
            projector.forward(a[i], b[i])
        }
        .map_err(to_py_err)?;
        out_a[i] = p;
        out_b[i] = q;
    }
    Ok((out_a.into_pyarray(py), out_b.into_pyarray(py)))
}

/// WGS84 UTM easting/northing of latitude/longitude arrays
#[pyfunction]
fn utm_forward<'py>(
    py: Python<'py>,
    lat: PyReadonlyArray1<f64>,
    lon: PyReadonlyArray1<f64>,
    zone: i32,
    south: bool,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    apply(py, &utm(zone, south)?, lat, lon, false)
}

/// WGS84 latitude/longitude of UTM easting/northing arrays
#[pyfunction]
fn utm_inverse<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<f64>,
    y: PyReadonlyArray1<f64>,
    zone: i32,
    south: bool,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    apply(py, &utm(zone, south)?, x, y, true)
}

fn polar_stereographic(slat: f64, slon: f64) -> PyResult<PolarStereographic> {
    let params = PolarStereographicParameters {
        slat,
        slon,
        false_easting: 0.0,
        false_northing: 0.0,
    };
    PolarStereographic::new(&params, &Ellipsoid::wgs84()).map_err(to_py_err)
}

#[pyfunction]
fn polar_stereographic_forward(lat: f64, lon: f64, slat: f64, slon: f64) -> PyResult<(f64, f64)> {
    polar_stereographic(slat, slon)?.forward(lat, lon).map_err(to_py_err)
}

#[pyfunction]
fn polar_stereographic_inverse(x: f64, y: f64, slat: f64, slon: f64) -> PyResult<(f64, f64)> {
    polar_stereographic(slat, slon)?.inverse(x, y).map_err(to_py_err)
}
