/*!
# Research Portal

A browser-based viewer for Excel workbooks, built in Rust.

## Overview

Users sign in with an email address, pick one of the `.xlsx` files found in
the working directory, choose which columns of each sheet they want to filter
by, and then browse every sheet in its own tab, narrowing rows with the
filters they set up.

Sign-in is an email-domain allow-list, not authentication. See [`login`].

## Architecture

### Core (always built)
- **Cell values** - Scalar cell contents with value equality and a notion of missing
- **Dataset / Workbook** - Named columns with a shared row count; sheets in file order
- **File Catalog** - Lists the `.xlsx` files of the working directory, skipping `~` lock files
- **Workbook Loader** - Reads every sheet of a file with calamine
- **Filter Configuration Store** - Filter columns chosen per sheet
- **Filter Application Engine** - `isin`-style row selection, combined with AND
- **Navigation State Machine** - login -> file_selection -> filter_setup -> data_view, plus back
- **View model** - Declarative tabs, filter descriptors, metrics and rows
- **Export** - CSV and XLSX downloads of a filtered sheet

### Web layer (`web` feature)
- **Routing** - axum handlers, one per form submission
- **Pages** - handlebars templates for the four stages
- **Sessions** - cookie-keyed in-memory registry, lost on restart

## Modules

- **cell**: `CellValue`
- **dataset**: `Dataset`, `Column`, `Workbook`
- **catalog**: file listing and the directory-backed workbook source
- **loader**: xlsx reading
- **filter**: filter store and filter engine
- **session**: the navigation state machine
- **view**: page models
- **login**: email gate and session registry
- **downloader**: CSV/XLSX export
- **config**: runtime settings
- **app**: routing and server bootstrap
- **pages**: template rendering

## Usage

```text
research-portal [data_dir] [bind_addr]
```

Serves `data_dir` (default `.`) on `bind_addr` (default `127.0.0.1:3000`).
Log output is controlled with `RUST_LOG`.
*/

pub mod catalog;
pub mod cell;
pub mod config;
pub mod dataset;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod loader;
pub mod login;
pub mod session;
pub mod view;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod pages;

/// Re-export the types most callers need
pub use catalog::FileCatalog;
pub use cell::CellValue;
pub use config::PortalConfig;
pub use dataset::{Column, Dataset, Sheet, Workbook};
pub use error::{PortalError, Result};
pub use filter::{FilterConfig, apply, apply_all, unique_values};
pub use loader::{WorkbookSource, load_workbook};
pub use login::authenticate;
pub use session::{Action, Context, FilterChoice, Session, Stage};
