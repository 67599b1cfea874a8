//! Shared test harness modules for the routecompare CLI.

use super::*;

mod helpers;
mod unit;
