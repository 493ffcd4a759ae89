#![allow(dead_code)]

use std::sync::Arc;

use obsel::{Selection, Table};

/// Route `tracing` output through the test harness; harmless when called twice.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A ten-integration index in the shape of a GBT SDFITS table.
pub fn index() -> Arc<Table> {
    let table = Table::builder()
        .ints("SCAN", vec![1, 1, 1, 2, 2, 3, 3, 3, 3, 4])
        .ints("IFNUM", vec![0, 0, 1, 1, 0, 0, 1, 1, 0, 0])
        .ints("PLNUM", vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1])
        .texts(
            "OBJECT",
            vec![
                "3C273", "3C273", "3C273", "NGC1234", "NGC1234", "W3OH", "W3OH", "3C286", "3C286",
                "3C286",
            ],
        )
        .texts("SIG", vec!["T", "T", "F", "F", "T", "T", "F", "F", "T", "T"])
        .floats(
            "CRVAL2",
            vec![187.5, 187.5, 187.5, 10.0, 10.0, 36.75, 36.75, 202.75, 202.75, 202.75],
        )
        .floats(
            "CRVAL3",
            vec![2.0, 2.0, 2.0, -5.0, -5.0, 61.75, 61.75, 30.5, 30.5, 30.5],
        )
        .floats("EXPOSURE", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0])
        .timestamps(
            "DATE-OBS",
            &[
                "2021_02_10_07:38:37",
                "2021_02_10_07:38:47",
                "2021_02_10_07:38:57",
                "2021_02_10_07:40:07",
                "2021_02_10_07:40:17",
                "2021_02_10_07:45:00",
                "2021_02_10_07:45:10",
                "2021_02_10_07:50:00",
                "2021_02_10_07:50:10",
                "2021_02_10_07:55:00",
            ],
        )
        .build()
        .expect("index table");
    Arc::new(table)
}

pub fn selection() -> Selection {
    init_logging();
    Selection::new(index())
}

pub fn rows(bitmap: &roaring::RoaringBitmap) -> Vec<u32> {
    bitmap.iter().collect()
}
