mod car;
mod operation;

pub use car::{Car, CreateCar, OilSpec, UpdateCar};
pub use operation::{
    MatchResult, Mismatch, Operation, OperationFilter, OperationPage, OperationType, Pagination,
    SubmitOperation,
};
