pub mod measurement;
pub mod user;

pub use measurement::{
    AthleteRef, InputError, Measurement, MeasurementInput, MeasurementKind, MeasurementPatch,
    MeasurementView, NewMeasurement, Payload,
};
pub use user::{AthletePatch, NewUser, Role, User, UserView};
