use std::io::Write;

use crate::{Aig, NodeKind, Result, aig::error::ParserError};

fn io_error(e: std::io::Error) -> ParserError {
    ParserError::IoError(e.to_string())
}

impl Aig {
    /// Writes the part of the AIG reachable from the outputs using ASCII AIGER format.
    ///
    /// Node ids are kept as variable indices, so the output can be read back with [`Aig::from_ascii`].
    /// Unused gates are not written, placeholders are referenced but never defined.
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// aig.add_input(2).unwrap();
    /// aig.new_and(3, AigEdge::new(1, true), AigEdge::new(2, false)).unwrap();
    /// aig.add_output(AigEdge::new(3, true)).unwrap();
    ///
    /// let mut buf = Vec::new();
    /// aig.write_ascii(&mut buf).unwrap();
    /// assert_eq!(String::from_utf8(buf).unwrap(), "aag 3 2 0 1 1\n2\n4\n7\n6 3 4\n");
    /// ```
    pub fn write_ascii(&self, mut writer: impl Write) -> Result<()> {
        let order = self.build_evaluation_order()?;
        let ands: Vec<_> = order
            .iter()
            .map(|&id| self.node(id))
            .filter(|n| n.is_and())
            .collect();

        let mut m = self.inputs.iter().copied().max().unwrap_or(0);
        for node in &ands {
            m = m.max(node.get_id());
            for fanin in node.get_fanins() {
                m = m.max(fanin.get_node_id());
            }
        }
        for fanin in self.get_output_edges() {
            m = m.max(fanin.get_node_id());
        }

        writeln!(
            writer,
            "aag {} {} 0 {} {}",
            m,
            self.inputs.len(),
            self.outputs.len(),
            ands.len()
        )
        .map_err(io_error)?;
        for &id in &self.inputs {
            writeln!(writer, "{}", 2 * id).map_err(io_error)?;
        }
        for fanin in self.get_output_edges() {
            writeln!(writer, "{}", fanin.to_aiger()).map_err(io_error)?;
        }
        for node in &ands {
            if let NodeKind::And { fanin0, fanin1 } = node.get_kind() {
                writeln!(
                    writer,
                    "{} {} {}",
                    2 * node.get_id(),
                    fanin0.to_aiger(),
                    fanin1.to_aiger()
                )
                .map_err(io_error)?;
            }
        }

        // Symbol table
        for (position, &id) in self.inputs.iter().enumerate() {
            if let Some(name) = self.node(id).get_name() {
                writeln!(writer, "i{} {}", position, name).map_err(io_error)?;
            }
        }
        for (position, &id) in self.outputs.iter().enumerate() {
            if let Some(name) = self.node(id).get_name() {
                writeln!(writer, "o{} {}", position, name).map_err(io_error)?;
            }
        }

        writer.flush().map_err(io_error)?;
        Ok(())
    }
}
