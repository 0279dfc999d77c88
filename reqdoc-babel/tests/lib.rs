// This file is required to make `cargo test` discover tests in subdirectories.

#[cfg(test)]
mod common;

#[cfg(test)]
mod docx;

#[cfg(test)]
mod markdown;

#[cfg(test)]
mod plain;

#[cfg(test)]
mod rst;

#[cfg(test)]
mod selector;
