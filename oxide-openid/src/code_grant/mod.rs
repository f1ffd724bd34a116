//! Available backend algorithms.
//!
//! The backend codifies the requirements of [RFC 6749], [RFC 7009], [RFC 7523] and OpenID Connect
//! Core into types and functions. Each step of a flow is a function over the request and the
//! primitives it needs, returning either a value or a [`ProtocolError`] that already knows how it
//! is reported to the requesting party.
//!
//! ## Usage
//!
//! For complete requests, have a look at the encapsulation provided by [`endpoint`] instead. The
//! functions here are the building blocks of those flows and can be combined differently, for
//! example to add a custom check between validation and response generation.
//!
//! [RFC 6749]: https://tools.ietf.org/html/rfc6749
//! [RFC 7009]: https://tools.ietf.org/html/rfc7009
//! [RFC 7523]: https://tools.ietf.org/html/rfc7523
//! [`ProtocolError`]: error/struct.ProtocolError.html
//! [`endpoint`]: ../endpoint/index.html

pub mod accesstoken;
pub mod authenticate;
pub mod consent;
pub mod error;
pub mod flow;
pub mod jwt;
pub mod mapping;
pub mod parameter;
pub mod process;
pub mod response;
pub mod revocation;
pub mod validation;
