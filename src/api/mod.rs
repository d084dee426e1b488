//! Client for the interview practice backend
//!
//! The backend owns the question bank and the practice history. The session
//! core only needs [`InterviewApi`]; [`HttpInterviewApi`] is the REST
//! implementation used by the binary.

mod client;

pub use client::{ApiError, HttpInterviewApi, InterviewApi};
