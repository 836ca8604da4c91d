use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AstNode {
    #[serde(rename = "COMMAND")]
    Command { name: String, args: Vec<String> },
    #[serde(rename = "PIPELINE")]
    Pipeline {
        // Invariant: two or more stages; a single command never gets a
        // Pipeline wrapper (the parser collapses it).
        #[serde(rename = "cmds")]
        stages: Vec<AstNode>,
    },
    #[serde(rename = "BINARYOP")]
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    // Grammar declared but not implemented yet. The parser never produces
    // these; the executor rejects them by name.
    #[serde(rename = "ASSIGNMENT")]
    Assignment,
    #[serde(rename = "REDIRECTION")]
    Redirection,
    #[serde(rename = "SUBSHELL")]
    Subshell,
    #[serde(rename = "IFNODE")]
    If,
    #[serde(rename = "FORNODE")]
    For,
    #[serde(rename = "CASENODE")]
    Case,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = ";")]
    Seq,
}

// Write a pretty-printed JSON rendering of the tree, for tooling and
// debugging. Not used on the execution path.
pub fn save_ast_json<P: AsRef<Path>>(node: &AstNode, path: P) -> io::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, node)?;
    Ok(())
}
