use serde::Serialize;
use std::io::{self, Write};

use crate::referrers::ReferrerEntry;
use crate::tree::PathTreeNode;

const INDENT: usize = 4;

/// Receives each report section as soon as the driver has it.
pub trait ReportSink {
    fn domains(&mut self, domains: &[String]) -> io::Result<()>;
    fn path_tree(&mut self, domain: &str, root: &PathTreeNode) -> io::Result<()>;
    fn referrers(&mut self, domain: &str, entries: &[ReferrerEntry]) -> io::Result<()>;
}

/// Plain console layout.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_node(&mut self, node: &PathTreeNode, depth: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "{:indent$}{} {}",
            "",
            node.name(),
            node.count(),
            indent = INDENT * depth
        )?;
        for child in node.children() {
            self.write_node(child, depth + 1)?;
        }
        Ok(())
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn domains(&mut self, domains: &[String]) -> io::Result<()> {
        writeln!(self.out, "Domains:")?;
        if domains.is_empty() {
            writeln!(self.out, "No domains found")?;
        }
        for domain in domains {
            writeln!(self.out, "{}", domain)?;
        }
        self.out.flush()
    }

    fn path_tree(&mut self, domain: &str, root: &PathTreeNode) -> io::Result<()> {
        writeln!(self.out, "Path tree for {}", domain)?;
        self.write_node(root, 0)?;
        self.out.flush()
    }

    fn referrers(&mut self, _domain: &str, entries: &[ReferrerEntry]) -> io::Result<()> {
        writeln!(self.out, "Referrer sites:")?;
        for entry in entries {
            writeln!(self.out, "{}, {}", entry.referrer, entry.count)?;
        }
        self.out.flush()
    }
}

#[derive(Debug, Serialize)]
pub struct TreeView {
    pub name: String,
    pub count: u64,
    pub children: Vec<TreeView>,
}

impl From<&PathTreeNode> for TreeView {
    fn from(node: &PathTreeNode) -> Self {
        Self {
            name: node.name().to_string(),
            count: node.count(),
            children: node.children().into_iter().map(TreeView::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
enum Section<'a> {
    Domains {
        domains: &'a [String],
    },
    PathTree {
        domain: &'a str,
        tree: TreeView,
    },
    Referrers {
        domain: &'a str,
        referrers: &'a [ReferrerEntry],
    },
}

/// One JSON object per section, newline-delimited.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, section: &Section<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, section).map_err(io::Error::from)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn domains(&mut self, domains: &[String]) -> io::Result<()> {
        self.emit(&Section::Domains { domains })
    }

    fn path_tree(&mut self, domain: &str, root: &PathTreeNode) -> io::Result<()> {
        self.emit(&Section::PathTree {
            domain,
            tree: TreeView::from(root),
        })
    }

    fn referrers(&mut self, domain: &str, entries: &[ReferrerEntry]) -> io::Result<()> {
        self.emit(&Section::Referrers {
            domain,
            referrers: entries,
        })
    }
}
