/// Data layer: core types, loading, normalization, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet        us.json (TopoJSON)
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                 ┌──────────┐
///   │  loader   │  RawRecord[]   │ topology  │  StateBoundaries
///   └──────────┘                 └──────────┘
///        │           (joined before normalizing)
///        ▼
///   ┌────────────┐
///   │ normalize   │  RawRecord[] → Dataset (typed, sentinels, allow-list)
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  six inclusive ranges → visible subset → scatter points
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod topology;
