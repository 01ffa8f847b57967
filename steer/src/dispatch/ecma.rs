use rquickjs::{Context, Ctx, Function, Runtime};
use std::fmt::{Display, Formatter};
use thiserror::Error;

// Compiled RegExp objects are cached per source inside the engine.
const REGEX_HELPERS: &str = r#"
var __steerRegexCache = new Map();
function __steerCompile(source) {
  var re = __steerRegexCache.get(source);
  if (re === undefined) {
    re = new RegExp(source);
    __steerRegexCache.set(source, re);
  }
  return re;
}
function __steerTest(source, subject) {
  return __steerCompile(source).test(subject);
}
"#;

thread_local! {
    static ENGINE: Option<Context> = match new_engine() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            tracing::error!("Failed to start regex engine: {}", e);
            None
        }
    };
}

fn new_engine() -> rquickjs::Result<Context> {
    let runtime = Runtime::new()?;
    let ctx = Context::full(&runtime)?;
    ctx.with(|ctx| ctx.eval::<(), _>(REGEX_HELPERS))?;
    Ok(ctx)
}

#[derive(Error, Debug)]
pub enum EcmaError {
    #[error("Regex engine unavailable")]
    Unavailable,
    #[error("{0}")]
    Script(String),
}

/// A regular expression with JavaScript `RegExp` semantics, the dialect PAC
/// scripts evaluate rules in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcmaRegex {
    source: String,
}

impl EcmaRegex {
    pub fn new(source: &str) -> Result<Self, EcmaError> {
        with_engine(|ctx| {
            let compile: Function = ctx.globals().get("__steerCompile")?;
            compile.call::<_, ()>((source,))
        })?;
        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn is_match(&self, subject: &str) -> bool {
        let result = with_engine(|ctx| {
            let test: Function = ctx.globals().get("__steerTest")?;
            test.call::<_, bool>((self.source.as_str(), subject))
        });
        match result {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!("Regex {:?} failed on {:?}: {}", self.source, subject, e);
                false
            }
        }
    }
}

impl Display for EcmaRegex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn with_engine<R>(
    f: impl for<'js> FnOnce(&Ctx<'js>) -> rquickjs::Result<R>,
) -> Result<R, EcmaError> {
    ENGINE.with(|engine| {
        let engine = engine.as_ref().ok_or(EcmaError::Unavailable)?;
        engine.with(|ctx| f(&ctx).map_err(|e| describe(&ctx, e)))
    })
}

fn describe(ctx: &Ctx<'_>, e: rquickjs::Error) -> EcmaError {
    if matches!(e, rquickjs::Error::Exception) {
        let v = ctx.catch();
        if let Some(msg) = v.as_exception().and_then(|ex| ex.message()) {
            return EcmaError::Script(msg);
        }
    }
    EcmaError::Script(e.to_string())
}
