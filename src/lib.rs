//! # Artefact Index
//!
//! Discovers geospatial artefacts in a file-system data store, validates
//! their `artefact.yml` manifests and keeps a searchable SQLite catalog in
//! sync with what is on disk.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Scanner   │──▶│   Service    │──▶│    SQLite    │
//! │ walk + YAML │   │ map+reconcile│   │  FTS5 (bm25) │
//! └─────────────┘   └──────┬───────┘   └──────┬───────┘
//!                          │                  │
//!                          ▼                  ▼
//!                    ┌──────────┐       ┌──────────┐
//!                    │  index   │       │ list/get │
//!                    │ (watch)  │       │  search  │
//!                    └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! artefacts init                     # create database
//! artefacts index                    # scan the data store
//! artefacts search "rivers" --lang en
//! artefacts list --filter only-base-maps
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Languages, artefact types, catalog documents |
//! | [`manifest`] | Manifest reading and validation |
//! | [`scanner`] | Data-store walk and concurrent manifest reads |
//! | [`identity`] | Artefact ids and root-relative paths |
//! | [`service`] | Indexing and the read API |
//! | [`store`] | Storage trait and in-memory store |
//! | [`sqlite_store`] | SQLite storage backend |
//! | [`search`] | Two-stage search |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod export;
pub mod identity;
pub mod index_cmd;
pub mod manifest;
pub mod migrate;
pub mod models;
pub mod query_cmd;
pub mod scanner;
pub mod search;
pub mod service;
pub mod sqlite_store;
pub mod stats;
pub mod store;
