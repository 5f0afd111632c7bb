use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    #[error("Destination buffer too small: {required} bytes required, {available} available")]
    DestinationTooSmall { required: usize, available: usize },

    #[error("Destination step {step} is smaller than a {width} pixels row")]
    DestinationStepTooSmall { step: usize, width: usize },

    #[error("{plane} plane too small: {required} bytes required, {available} available")]
    PlaneTooSmall {
        plane: char,
        required: usize,
        available: usize,
    },

    #[error("{plane} plane stride {stride} is smaller than its {width} samples row")]
    StrideTooSmall {
        plane: char,
        stride: usize,
        width: usize,
    },
}
