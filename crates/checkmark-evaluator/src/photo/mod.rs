// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photo module — decoding photos, resizing to the working resolution, saving results.

pub mod loader;

pub use loader::{SheetImage, save_image};
