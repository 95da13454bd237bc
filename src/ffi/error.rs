//! Error conversion utilities for FFI.

use super::raw::*;
use crate::error::Error;

/// Symbolic name of a native status code, or `"CL_UNKNOWN_ERROR"`.
pub fn error_name(code: ClInt) -> &'static str {
    match code {
        CL_SUCCESS => "CL_SUCCESS",
        CL_DEVICE_NOT_FOUND => "CL_DEVICE_NOT_FOUND",
        CL_DEVICE_NOT_AVAILABLE => "CL_DEVICE_NOT_AVAILABLE",
        CL_COMPILER_NOT_AVAILABLE => "CL_COMPILER_NOT_AVAILABLE",
        CL_MEM_OBJECT_ALLOCATION_FAILURE => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
        CL_OUT_OF_RESOURCES => "CL_OUT_OF_RESOURCES",
        CL_OUT_OF_HOST_MEMORY => "CL_OUT_OF_HOST_MEMORY",
        CL_BUILD_PROGRAM_FAILURE => "CL_BUILD_PROGRAM_FAILURE",
        CL_INVALID_VALUE => "CL_INVALID_VALUE",
        CL_INVALID_PLATFORM => "CL_INVALID_PLATFORM",
        CL_INVALID_DEVICE => "CL_INVALID_DEVICE",
        CL_INVALID_CONTEXT => "CL_INVALID_CONTEXT",
        CL_INVALID_COMMAND_QUEUE => "CL_INVALID_COMMAND_QUEUE",
        CL_INVALID_MEM_OBJECT => "CL_INVALID_MEM_OBJECT",
        CL_INVALID_SAMPLER => "CL_INVALID_SAMPLER",
        CL_INVALID_PROGRAM => "CL_INVALID_PROGRAM",
        CL_INVALID_KERNEL => "CL_INVALID_KERNEL",
        CL_INVALID_EVENT => "CL_INVALID_EVENT",
        _ => "CL_UNKNOWN_ERROR",
    }
}

/// Convert a native status code to a Rust Error.
pub fn error_from_cl(code: ClInt) -> Error {
    Error::Native {
        code,
        name: error_name(code),
    }
}

/// Check a native status code and convert to Result.
pub fn check_error(code: ClInt) -> crate::Result<()> {
    if code == CL_SUCCESS {
        Ok(())
    } else {
        Err(error_from_cl(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_ok() {
        assert!(check_error(CL_SUCCESS).is_ok());
    }

    #[test]
    fn test_known_code_is_named() {
        let err = check_error(CL_INVALID_CONTEXT).unwrap_err();
        match err {
            Error::Native { code, name } => {
                assert_eq!(code, CL_INVALID_CONTEXT);
                assert_eq!(name, "CL_INVALID_CONTEXT");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(error_name(-9999), "CL_UNKNOWN_ERROR");
    }
}
