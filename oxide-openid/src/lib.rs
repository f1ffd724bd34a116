//! # oxide-openid
//!
//! The authorization flow and token issuance engine of an OpenID Connect provider, with the JOSE
//! layer it needs to seal id tokens and check client assertions.
//!
//! ## About
//!
//! `oxide-openid` decides, for an incoming authorization request, which protocol flow applies,
//! validates the requesting client and the consent of its resource owner, and produces the
//! authorization code, access token and id token of the response. Id tokens are signed and, if
//! the client asks for it, encrypted. Clients authenticate with a shared secret or with a signed
//! JWT assertion whose `jti` can be used only once. Issued tokens can be revoked by their client.
//!
//! HTTP handling, the login and consent pages, and the storage of clients, consents and tokens
//! are not part of this library. Each store is a trait in [`primitives`], and there is a simple
//! in-memory implementation provided for each of those.
//!
//! ## Usage
//!
//! Choose a set of [`primitives`] and bundle them into an [`Endpoint`]. In simple cases this can
//! be the [`Generic`] struct. The [`Authorization`] flow then turns the parameters of a request
//! and the logged in resource owner into an [`ActionResult`]: either a redirect back to the
//! client carrying the response, or a redirect to the login or consent page of the server.
//!
//! Errors are [`ProtocolError`]s. Once the `redirect_uri` of a request has been verified, they
//! know how to encode themselves into it, otherwise they are rendered as a json body.
//!
//! The building blocks of the flows are found in [`code_grant`], the cryptography in [`jose`].
//! Configuration lives in [`settings`], and every decision of a flow is reported as a `tracing`
//! event through [`audit`].
//!
//! [`primitives`]: primitives/index.html
//! [`Endpoint`]: endpoint/trait.Endpoint.html
//! [`Generic`]: endpoint/struct.Generic.html
//! [`Authorization`]: endpoint/struct.Authorization.html
//! [`ActionResult`]: code_grant/response/struct.ActionResult.html
//! [`ProtocolError`]: code_grant/error/struct.ProtocolError.html
//! [`code_grant`]: code_grant/index.html
//! [`jose`]: jose/index.html
//! [`settings`]: settings/index.html
//! [`audit`]: audit/index.html
#![warn(missing_docs)]

#[macro_use]
extern crate serde_derive;

#[macro_use]
pub mod wire;

pub mod audit;
pub mod code_grant;
pub mod endpoint;
pub mod jose;
pub mod primitives;
pub mod settings;
