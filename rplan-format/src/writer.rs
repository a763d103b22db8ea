//! Implements the writing of plan and layout files.

use std::io::BufWriter;
use std::io::Write;

use crate::NodeLine;
use crate::PlanAction;

/// The characters a backslash escapes inside a plan-file name.
const PLAN_DELIMITERS: &[char] = &['\\', ',', '(', ')'];
/// The characters a backslash escapes inside a layout-file name.
const LAYOUT_DELIMITERS: &[char] = &['\\', ' ', ':'];

fn escaped(name: &str, delimiters: &[char]) -> String {
    let mut out = String::with_capacity(name.len());
    for character in name.chars() {
        if delimiters.contains(&character) {
            out.push('\\');
        }
        out.push(character);
    }
    out
}

/// Writes plan files, one action per line in the canonical `kind(args...,start,end)` form.
///
/// # Example
/// ```
/// use rplan_format::writer::PlanWriter;
/// use rplan_format::PlanAction;
///
/// let mut sink: Vec<u8> = Vec::new();
/// let mut writer = PlanWriter::new(&mut sink);
/// writer
///     .write_action(&PlanAction::Migrate {
///         vm: "vm3".to_owned(),
///         from: "n1".to_owned(),
///         to: "n4".to_owned(),
///         start: 0,
///         end: 5,
///     })
///     .unwrap();
/// writer.finish().unwrap();
///
/// assert_eq!(sink, b"migrate(vm3,n1,n4,0,5)\n");
/// ```
#[derive(Debug)]
pub struct PlanWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> PlanWriter<W> {
    pub fn new(sink: W) -> Self {
        PlanWriter {
            writer: BufWriter::new(sink),
        }
    }

    /// Writes a single action line.
    ///
    /// This function wraps an IO operation, which is why it can fail with an IO error.
    pub fn write_action(&mut self, action: &PlanAction) -> std::io::Result<()> {
        let (names, start, end): (Vec<&str>, u32, u32) = match action {
            PlanAction::Run { vm, host, start, end } => {
                (vec![vm.as_str(), host.as_str()], *start, *end)
            }
            PlanAction::Migrate {
                vm,
                from,
                to,
                start,
                end,
            }
            | PlanAction::Resume {
                vm,
                from,
                to,
                start,
                end,
            } => (vec![vm.as_str(), from.as_str(), to.as_str()], *start, *end),
            PlanAction::Startup { node, start, end }
            | PlanAction::Shutdown { node, start, end } => (vec![node.as_str()], *start, *end),
            PlanAction::Suspend { vm, on, start, end }
            | PlanAction::Stop { vm, on, start, end } => {
                (vec![vm.as_str(), on.as_str()], *start, *end)
            }
        };

        write!(self.writer, "{}(", action.keyword())?;
        for name in names {
            write!(self.writer, "{},", escaped(name, PLAN_DELIMITERS))?;
        }
        writeln!(self.writer, "{start},{end})")
    }

    /// Flushes the underlying sink.
    pub fn finish(mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Writes configuration layout files: one line per online node, `name : vm...`.
///
/// # Example
/// ```
/// use rplan_format::writer::LayoutWriter;
/// use rplan_format::NodeLine;
///
/// let mut sink: Vec<u8> = Vec::new();
/// let mut writer = LayoutWriter::new(&mut sink);
/// writer
///     .write_node(&NodeLine {
///         node: "n1".to_owned(),
///         vms: vec!["vm1".to_owned(), "vm2".to_owned()],
///     })
///     .unwrap();
/// writer.finish().unwrap();
///
/// assert_eq!(sink, b"n1 : vm1 vm2\n");
/// ```
#[derive(Debug)]
pub struct LayoutWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> LayoutWriter<W> {
    pub fn new(sink: W) -> Self {
        LayoutWriter {
            writer: BufWriter::new(sink),
        }
    }

    pub fn write_node(&mut self, line: &NodeLine) -> std::io::Result<()> {
        write!(self.writer, "{} :", escaped(&line.node, LAYOUT_DELIMITERS))?;
        for vm in &line.vms {
            write!(self.writer, " {}", escaped(vm, LAYOUT_DELIMITERS))?;
        }
        writeln!(self.writer)
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
