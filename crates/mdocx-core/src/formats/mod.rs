// SPDX-License-Identifier: AGPL-3.0-or-later
//! Source-format front-ends producing node events

pub mod markdown;

pub use markdown::MarkdownSource;
