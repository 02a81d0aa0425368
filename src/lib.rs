/*!
 * # lexlate - structure-preserving translation of legal documents
 *
 * A Rust library that translates DOCX documents with AI while keeping their
 * structure, formatting and layout intact.
 *
 * ## Features
 *
 * - Extract paragraph-level text units from the body, headers, footers,
 *   footnotes and table cells of a document
 * - Detect legal sections (recitals, definitions, liability, ...) to give the
 *   model section context
 * - Translate in size-bounded batches over a bounded number of concurrent calls:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 *   - LM Studio (OpenAI-compatible)
 * - Re-inject translations into the original runs, spreading text across
 *   formatting spans
 * - Repair layout artifacts (forced page breaks, keep-with-next chains,
 *   fixed spacing) that become wrong once text length changes
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Container codec, XML tree, parser, rebuilder and layout repair
 * - `translation`: Batch planning, prompts, scheduling and the pipeline
 * - `providers`: Client implementations for various LLM providers
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use document::{Container, ParsedDocument, StructureParser, StructureRebuilder, TextUnit};
pub use errors::{AppError, ArchiveError, PipelineError, ProviderError, XmlError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use translation::{CancellationToken, LlmTranslator, PipelineResult, TranslationPipeline};
