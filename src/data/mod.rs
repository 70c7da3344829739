/// Data layer: raw parameter reading, typing, and spectrum reconstruction.
///
/// Architecture:
/// ```text
///  <experiment>/acqus, acqu2s, pdata/1/procs, pdata/1/1r
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parameter files → RawExperiment (untyped registers)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  acqu[N]s sections → dimension count
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  registers → General / Direct / Indirect records
///   └───────────┘
///        │ (1D only)
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │ spectrum  │ ──▶ │  filter   │  shift axis + intensities → windowed trace
///   └──────────┘     └──────────┘
/// ```

pub mod classify;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod spectrum;
