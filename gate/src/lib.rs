// Life of a request:
// 1. The gate checks the transport and redirects plaintext when https is required
// 2. Basic credentials, then bearer tokens, are authenticated through the providers
// 3. The ordered access rules decide; with the default policy everything passes
// 4. Handlers guard their own operations with the SecurityContext
// 5. Security headers are written on the way out
//
// System components:
//  - auth: credentials, principals, bcrypt encoder, JWT verification, providers
//  - security: policy, gate, middleware, per-operation guards
//  - config: environment configuration

pub mod app;
pub mod auth;
pub mod config;
pub mod security;

mod e2e_tests;
