use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use mlua::prelude::*;
use mlua::{HookTriggers, StdLib, VmState};
use regex::Regex;

use crate::error::FilterError;
use crate::logger;
use crate::types::ItemRecord;

/// A compiled filter expression. Cheap to clone; all clones share one Lua function.
#[derive(Clone, Debug)]
pub struct LuaPredicate {
    func: LuaFunction,
}

/// Lua VM that turns filter text into predicates over [`ItemRecord`]s.
///
/// A filter is a single Lua expression with the item bound to `item`:
///
/// ```text
/// item.rarity == "Unique" and F.re(item.name, "^Mageblood")
/// ```
///
/// The VM only carries the string, math and table libraries, and each
/// evaluation may run at most [`INSTRUCTION_BUDGET`] VM instructions.
pub struct FilterEngine {
    lua: Lua,
    /// Hook ticks left for the evaluation in flight
    budget: Rc<Cell<u32>>,
}

/// Instructions between two budget checks.
const HOOK_PERIOD: u32 = 1_000;

/// Most VM instructions one evaluation may execute.
pub const INSTRUCTION_BUDGET: u32 = 200_000;

/// Base-library functions that reach the filesystem or load code.
const UNSAFE_GLOBALS: [&str; 4] = ["dofile", "loadfile", "load", "require"];

impl FilterEngine {
    pub fn new() -> Result<Self, FilterError> {
        let engine_err = |e: LuaError| FilterError::Engine(e.to_string());
        let lua = Lua::new_with(StdLib::STRING | StdLib::MATH | StdLib::TABLE, LuaOptions::default())
            .map_err(engine_err)?;
        for name in UNSAFE_GLOBALS {
            lua.globals().set(name, LuaNil).map_err(engine_err)?;
        }
        register_globals(&lua).map_err(engine_err)?;

        let budget = Rc::new(Cell::new(0));
        let remaining = Rc::clone(&budget);
        lua.set_hook(HookTriggers::new().every_nth_instruction(HOOK_PERIOD), move |_, _| {
            let left = remaining.get();
            if left == 0 {
                return Err(LuaError::RuntimeError("filter exceeded its instruction budget".to_string()));
            }
            remaining.set(left - 1);
            Ok(VmState::Continue)
        });
        Ok(Self { lua, budget })
    }

    /// Compile `source` into a predicate. Lua syntax errors come back as
    /// [`FilterError::Syntax`], anything else as [`FilterError::Engine`].
    pub fn compile(&self, source: &str) -> Result<LuaPredicate, FilterError> {
        // Newline before the closing paren so a trailing `--` comment can't eat it
        let chunk = format!("local item = ...\nreturn ({}\n)", source);
        self.lua
            .load(&chunk)
            .set_name("filter")
            .into_function()
            .map(|func| LuaPredicate { func })
            .map_err(|e| match e {
                LuaError::SyntaxError { message, .. } => FilterError::Syntax(message),
                other => FilterError::Engine(other.to_string()),
            })
    }

    /// Run `predicate` against one item. Lua truthiness decides the match.
    pub fn evaluate(&self, predicate: &LuaPredicate, item: &ItemRecord) -> Result<bool, FilterError> {
        let eval_err = |e: LuaError| FilterError::Evaluate(e.to_string());
        let table = item_table(&self.lua, item).map_err(eval_err)?;
        self.budget.set(INSTRUCTION_BUDGET / HOOK_PERIOD);
        let value: LuaValue = predicate.func.call(table).map_err(eval_err)?;
        Ok(!matches!(value, LuaValue::Nil | LuaValue::Boolean(false)))
    }
}

fn item_table(lua: &Lua, item: &ItemRecord) -> LuaResult<LuaTable> {
    let t = lua.create_table()?;
    t.set("name", item.name.as_str())?;
    t.set("base_name", item.base_name.as_str())?;
    t.set("class", item.class.as_str())?;
    t.set("rarity", item.rarity.as_str())?;
    t.set("item_level", item.item_level)?;
    t.set("stack_size", item.stack_size)?;
    t.set("width", item.width)?;
    t.set("height", item.height)?;
    t.set("highlighted", item.highlighted)?;
    Ok(t)
}

/// Register the F.* helper table into a Lua state.
fn register_globals(lua: &Lua) -> LuaResult<()> {
    let f_table = lua.create_table()?;

    // F.re(text, pattern): regex match, patterns compiled once per engine
    let regexes: Rc<RefCell<HashMap<String, Regex>>> = Rc::new(RefCell::new(HashMap::new()));
    let re_fn = lua.create_function(move |_, (text, pattern): (String, String)| {
        let mut cache = regexes.borrow_mut();
        if !cache.contains_key(&pattern) {
            let re = Regex::new(&pattern)
                .map_err(|e| LuaError::RuntimeError(format!("invalid pattern '{}': {}", pattern, e)))?;
            cache.insert(pattern.clone(), re);
        }
        Ok(cache.get(&pattern).is_some_and(|re| re.is_match(&text)))
    })?;
    f_table.set("re", re_fn)?;

    // F.log(msg), for debugging a filter from inside the expression
    let log_fn = lua.create_function(|_, msg: String| {
        logger::info_p("filter", &msg);
        Ok(true)
    })?;
    f_table.set("log", log_fn)?;

    lua.globals().set("F", f_table)?;
    Ok(())
}
