//! The Sable compilation engine.

use alloc::sync::Arc;
use core::fmt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use url::Url;

use super::{
    Configuration, EngineOptions, Error, Expression, FailureMode, Namespaces, Script,
};
use crate::evaluator::{Arithmetic, StandardArithmetic};
use crate::introspection::{Introspector, ValueResolver};
use crate::parser::{NodeKind, ParseError, ParseErrorKind, PestTranslator, Translate, Tree};
use crate::source::{FileSource, ScriptSource, SourceError, SourceLoader, UrlSource};
use crate::{Box, String, ToString, format};

/// The Sable compilation engine.
///
/// The engine manages:
/// - the configuration bundle threaded into every evaluation
/// - a single translator, shared by all callers behind a mutex
/// - resource limits (EngineOptions)
///
/// An engine is `Send + Sync`; wrap it in an `Arc` to compile from several
/// threads. Compilation blocks while another thread is translating.
///
/// # Example
///
/// ```
/// use sable_core::{Engine, FailureMode};
/// use sable_core::evaluator::MapContext;
///
/// let engine = Engine::builder()
///     .failure_mode(FailureMode::Strict)
///     .build()
///     .unwrap();
///
/// let script = engine.compile_script("total = a + b; total * 2").unwrap();
/// let mut ctx = MapContext::new().with("a", 1).with("b", 2);
/// assert_eq!(script.execute(&mut ctx).unwrap().as_int(), Some(6));
/// ```
pub struct Engine {
    config: RwLock<Arc<Configuration>>,
    translator: Mutex<Box<dyn Translate>>,
    options: EngineOptions,
}

impl Engine {
    /// Create an engine with every setting at its default.
    pub fn new() -> Self {
        let options = EngineOptions::default();
        Self {
            config: RwLock::new(Configuration::shared_default()),
            translator: Mutex::new(Box::new(PestTranslator::new(options.max_parse_depth))),
            options,
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The current configuration bundle.
    pub fn configuration(&self) -> Arc<Configuration> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn namespaces(&self) -> Namespaces {
        self.configuration().namespaces().clone()
    }

    /// Replace the namespaces.
    ///
    /// Swaps in a new bundle. Programs compiled earlier keep the namespaces
    /// they were compiled with.
    pub fn set_namespaces(&self, namespaces: Namespaces) {
        self.replace_configuration(|config| config.with_namespaces(namespaces));
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.configuration().failure_mode()
    }

    pub fn is_suppressing_failures(&self) -> bool {
        self.configuration().is_suppressing_failures()
    }

    /// Replace the failure mode, with the same visibility rule as
    /// [`set_namespaces`](Self::set_namespaces).
    pub fn set_failure_mode(&self, mode: FailureMode) {
        self.replace_configuration(|config| config.with_failure_mode(mode));
    }

    fn replace_configuration(&self, update: impl FnOnce(&Configuration) -> Configuration) {
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(update(&current));
        *current = next;
    }

    /// Compile a single-value expression.
    ///
    /// The text is trimmed and terminated with `;` if needed. When it holds
    /// several top-level units only the first is kept, and a warning is
    /// logged; [`Expression::discarded_units`] reports how many were dropped.
    /// The expression keeps the caller's text, not the normalized one.
    pub fn compile_expression(&self, text: &str) -> Result<Expression, Error> {
        let source = normalize(text);
        let tree = self.translate(&source)?;
        let config = self.configuration();

        let source = tree.source.clone();
        let discarded = tree.unit_count().saturating_sub(1);
        let (_, span, units) = tree.into_units();
        let Some(first) = units.into_iter().next() else {
            return Err(Error::Syntax(ParseError::new(
                ParseErrorKind::EmptyProgram,
                source.to_string(),
                span,
            )));
        };

        if discarded > 0 {
            tracing::warn!(
                expression = text,
                discarded,
                "Expression has more than one unit; only the first is used"
            );
        }

        Ok(Expression::new(
            config,
            String::from(text),
            source,
            first,
            discarded,
        ))
    }

    /// Compile a whole program.
    ///
    /// Fails with [`Error::Structural`] if the translated root is not a
    /// script, which only a custom translator can produce.
    pub fn compile_script(&self, text: &str) -> Result<Script, Error> {
        let source = normalize(text);
        let tree = self.translate(&source)?;
        let config = self.configuration();

        if tree.root.kind != NodeKind::Script {
            return Err(Error::Structural {
                found: tree.root.kind.tag(),
            });
        }
        Ok(Script::new(config, source, tree.root))
    }

    /// Compile a script from a file or URL handle.
    ///
    /// The text is read before the translator is locked. A missing handle
    /// fails with [`Error::SourceUnavailable`].
    pub fn compile_script_from(&self, source: Option<&ScriptSource>) -> Result<Script, Error> {
        let source = source.ok_or(SourceError::Missing)?;
        let text = source.load()?;
        self.compile_script(&text)
    }

    pub fn compile_script_file(&self, path: impl AsRef<Path>) -> Result<Script, Error> {
        let text = FileSource::new(path.as_ref()).load()?;
        self.compile_script(&text)
    }

    pub fn compile_script_url(&self, url: &Url) -> Result<Script, Error> {
        let text = UrlSource::new(url).load()?;
        self.compile_script(&text)
    }

    /// Run the shared translator on normalized text.
    ///
    /// The lock is held for the translation call only. A panicking translator
    /// is reported as [`Error::InternalTranslation`] and never poisons the
    /// lock; a lock poisoned anyway is recovered, since translators reset
    /// their state on every call.
    fn translate(&self, source: &str) -> Result<Tree, Error> {
        tracing::debug!(source, "Translating");
        let mut translator = self
            .translator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| translator.translate(source)));
        drop(translator);

        match outcome {
            Ok(result) => result.map_err(Error::from),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(%message, "Translator panicked");
                Err(Error::InternalTranslation(message))
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.configuration())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Engine`]. Every setting is optional.
///
/// Defaults: [`Introspector`], lenient [`StandardArithmetic`], the shared
/// empty [`Namespaces`], [`FailureMode::Suppressing`], default
/// [`EngineOptions`] and a [`PestTranslator`].
#[derive(Default)]
pub struct EngineBuilder {
    resolver: Option<Arc<dyn ValueResolver>>,
    arithmetic: Option<Arc<dyn Arithmetic>>,
    namespaces: Option<Namespaces>,
    failure_mode: Option<FailureMode>,
    options: Option<EngineOptions>,
    translator: Option<Box<dyn Translate>>,
}

impl EngineBuilder {
    pub fn resolver(mut self, resolver: impl ValueResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn arithmetic(mut self, arithmetic: impl Arithmetic + 'static) -> Self {
        self.arithmetic = Some(Arc::new(arithmetic));
        self
    }

    pub fn namespaces(mut self, namespaces: Namespaces) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = Some(mode);
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Use a custom translator instead of the bundled one.
    pub fn translator(mut self, translator: impl Translate + 'static) -> Self {
        self.translator = Some(Box::new(translator));
        self
    }

    pub fn build(self) -> Result<Engine, Error> {
        let options = self.options.unwrap_or_default();
        if options.max_parse_depth == 0 {
            return Err(Error::Configuration(
                "max_parse_depth must be at least 1".to_string(),
            ));
        }
        if options.max_eval_depth == 0 {
            return Err(Error::Configuration(
                "max_eval_depth must be at least 1".to_string(),
            ));
        }

        let uses_defaults = self.resolver.is_none()
            && self.arithmetic.is_none()
            && self.namespaces.is_none()
            && self.failure_mode.is_none()
            && options.max_eval_depth == EngineOptions::default().max_eval_depth;

        let config = if uses_defaults {
            Configuration::shared_default()
        } else {
            Arc::new(Configuration::new(
                self.resolver.unwrap_or_else(|| Arc::new(Introspector)),
                self.arithmetic
                    .unwrap_or_else(|| Arc::new(StandardArithmetic::lenient())),
                self.namespaces.unwrap_or_default(),
                self.failure_mode.unwrap_or_default(),
                options.max_eval_depth,
            ))
        };

        let translator = self
            .translator
            .unwrap_or_else(|| Box::new(PestTranslator::new(options.max_parse_depth)));

        tracing::debug!(?options, "Engine built");
        Ok(Engine {
            config: RwLock::new(config),
            translator: Mutex::new(translator),
            options,
        })
    }
}

/// Trim the text and make sure it ends with a statement terminator.
pub(crate) fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.ends_with(';') {
        String::from(trimmed)
    } else {
        format!("{};", trimmed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        String::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("translator panicked")
    }
}
