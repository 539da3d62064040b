pub mod geometry;
pub mod parcel;
pub mod selection;

pub use geometry::{DistanceUnit, Geometry, GeometryType, LngLat, FEET_TO_KILOMETERS};
pub use parcel::{AttributeValue, Attributes, Parcel, ParcelId};
pub use selection::{
    BufferResult, BufferSpec, Generation, QueryClass, QueryKind, Selection, MAX_BUFFER_FEET,
};
