//! Grade extraction and competitive ranking for admission applications.
//!
//! The library covers the two load-bearing subsystems of the admission
//! service: an asynchronous OCR pipeline that turns a photographed
//! transcript into a numeric grade average, and a ranking engine that
//! orders competing applications for scarce slots. Everything else the
//! surrounding system does (identity, messaging, payments) is consumed
//! through the storage traits in [`pipeline`].

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
