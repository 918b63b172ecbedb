use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use crate::{Aig, AigEdge, AigError, NodeId, Result, aig::error::ParserError};

fn read_u64(s: &str) -> std::result::Result<u64, ParserError> {
    s.parse::<u64>()
        .map_err(|_| ParserError::InvalidToken(s.to_string() + " expected u64"))
}

fn check_even(x: u64) -> Result<()> {
    if x & 1 == 1 {
        return Err(ParserError::InvalidToken(
            "expected literal to be even, got ".to_string() + &x.to_string(),
        )
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    m: u64,
    i: u64,
    o: u64,
    a: u64,
}

impl TryFrom<&str> for Header {
    type Error = ParserError;

    fn try_from(line: &str) -> std::result::Result<Self, Self::Error> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.len() < 6 {
            return Err(ParserError::InvalidToken(
                "missing header tokens".to_string(),
            ));
        }

        if tokens[0] != "aag" {
            return Err(ParserError::InvalidToken(
                "expected aag, only the ASCII format is supported".to_string(),
            ));
        }

        let m = read_u64(tokens[1])?;
        let i = read_u64(tokens[2])?;
        let l = read_u64(tokens[3])?;
        let o = read_u64(tokens[4])?;
        let a = read_u64(tokens[5])?;

        if tokens.len() > 6 {
            return Err(ParserError::UnsupportedFeature(
                "header only supports M I L O A".to_string(),
            ));
        }

        if l != 0 {
            return Err(ParserError::UnsupportedFeature(
                "latches are not supported, expected L = 0".to_string(),
            ));
        }

        Ok(Header { m, i, o, a })
    }
}

/// Reads the next line, an early end of file is an error.
fn next_line(reader: &mut impl BufRead, line: &mut String) -> Result<()> {
    line.clear();
    let n = reader
        .read_line(line)
        .map_err(|e| ParserError::IoError(e.to_string()))?;
    if n == 0 {
        return Err(ParserError::InvalidToken("unexpected end of file".to_string()).into());
    }
    Ok(())
}

fn read_literal(header: &Header, s: &str) -> Result<AigEdge> {
    let lit = read_u64(s)?;
    if lit >> 1 > header.m {
        return Err(ParserError::InvalidToken(format!(
            "literal {} is above the maximum variable index {}",
            lit, header.m
        ))
        .into());
    }
    Ok(AigEdge::from_aiger(lit))
}

fn read_input(header: &Header, line: &str) -> Result<NodeId> {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();

    if tokens.is_empty() {
        return Err(
            ParserError::InvalidToken("expected input token, got nothing".to_string()).into(),
        );
    }

    if tokens.len() > 1 {
        return Err(ParserError::InvalidToken(
            "expected nothing after input, got ".to_string() + tokens[1],
        )
        .into());
    }

    let i = read_u64(tokens[0])?;
    check_even(i)?;
    if i == 0 {
        return Err(ParserError::InvalidToken("the constant cannot be an input".to_string()).into());
    }
    Ok(read_literal(header, tokens[0])?.get_node_id())
}

fn read_output(header: &Header, line: &str) -> Result<AigEdge> {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();

    if tokens.is_empty() {
        return Err(ParserError::InvalidToken(
            "expected output token, got nothing".to_string(),
        )
        .into());
    }

    if tokens.len() > 1 {
        return Err(ParserError::InvalidToken(
            "expected nothing after output, got ".to_string() + tokens[1],
        )
        .into());
    }

    read_literal(header, tokens[0])
}

fn read_and(header: &Header, line: &str) -> Result<(NodeId, AigEdge, AigEdge)> {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();

    if tokens.len() < 3 {
        return Err(ParserError::InvalidToken("not enough and tokens".to_string()).into());
    }

    if tokens.len() > 3 {
        return Err(ParserError::InvalidToken(
            "expected nothing after and tokens, got ".to_string() + tokens[3],
        )
        .into());
    }

    let id = read_u64(tokens[0])?;
    check_even(id)?;
    let id = read_literal(header, tokens[0])?.get_node_id();
    let fanin0 = read_literal(header, tokens[1])?;
    let fanin1 = read_literal(header, tokens[2])?;
    Ok((id, fanin0, fanin1))
}

/// A symbol line, eg `i0 clk` or `o3 carry`.
/// Returns whether it names an input, its position and the name.
fn read_symbol(line: &str) -> Result<(bool, usize, String)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (tag, name) = line.split_once(' ').ok_or(ParserError::InvalidToken(
        "expected a symbol name after ".to_string() + line,
    ))?;
    let is_input = match tag.chars().next() {
        Some('i') => true,
        Some('o') => false,
        Some('l') => {
            return Err(ParserError::UnsupportedFeature("latch symbols".to_string()).into());
        }
        _ => {
            return Err(ParserError::InvalidToken("invalid symbol ".to_string() + tag).into());
        }
    };
    let position = read_u64(&tag[1..])? as usize;
    if name.is_empty() {
        return Err(ParserError::InvalidToken("empty symbol name".to_string()).into());
    }
    Ok((is_input, position, name.to_string()))
}

/// Makes sure the node behind a literal is known, as a placeholder if needed.
fn reserve(aig: &mut Aig, edge: AigEdge) -> Result<()> {
    aig.declare(edge.get_node_id())?;
    Ok(())
}

impl Aig {
    /// Creates an AIG from an open .aag file using ASCII format.
    ///
    /// Use this function if the file is already open with the reader.
    ///
    /// Literals used before their definition are held by placeholders. Literals never defined
    /// stay placeholders, see [`Aig::floating_gates`].
    ///
    /// ```rust
    /// use std::io::BufReader;
    /// use fraig::Aig;
    /// let text = "aag 3 2 0 1 1\n2\n4\n6\n6 2 5\ni0 a\no0 y\n";
    /// let aig = Aig::from_ascii(BufReader::new(text.as_bytes())).unwrap();
    /// assert_eq!(aig.get_inputs(), &[1, 2]);
    /// assert_eq!(aig.and_count().unwrap(), 1);
    /// assert_eq!(aig.get_node(1).unwrap().get_name(), Some("a"));
    /// ```
    pub fn from_ascii(mut reader: BufReader<impl Read>) -> Result<Self> {
        let mut line: String = String::new();

        // Reading the header
        next_line(&mut reader, &mut line)?;
        let header: Header = Header::try_from(line.as_str())?;

        let mut aig = Aig::new();

        for _ in 0..header.i {
            next_line(&mut reader, &mut line)?;
            let id = read_input(&header, &line)?;
            // Inputs come first, so any known id is a repeated input
            if aig.get_any_node(id).is_some() {
                return Err(AigError::DuplicateId(id));
            }
            aig.add_input(id)?;
        }

        // Outputs can refer to gates defined further down
        let mut outputs = Vec::new();
        for _ in 0..header.o {
            next_line(&mut reader, &mut line)?;
            outputs.push(read_output(&header, &line)?);
        }

        for _ in 0..header.a {
            next_line(&mut reader, &mut line)?;
            let (id, fanin0, fanin1) = read_and(&header, &line)?;
            reserve(&mut aig, fanin0)?;
            reserve(&mut aig, fanin1)?;
            aig.new_and(id, fanin0, fanin1)?;
        }

        for fanin in outputs {
            reserve(&mut aig, fanin)?;
            aig.add_output(fanin)?;
        }

        // Symbol table, until the comment section
        loop {
            line.clear();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| ParserError::IoError(e.to_string()))?;
            if n == 0 || line.starts_with('c') {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let (is_input, position, name) = read_symbol(&line)?;
            let ids = if is_input {
                aig.get_inputs()
            } else {
                aig.get_outputs()
            };
            let id = *ids.get(position).ok_or(ParserError::InvalidToken(format!(
                "symbol {} refers to a missing position",
                position
            )))?;
            aig.set_name(id, name)?;
        }

        log::info!(
            "Read aag with {} inputs, {} outputs and {} and gates",
            header.i,
            header.o,
            header.a
        );

        // Is the AIG okay?
        aig.check_integrity()?;

        Ok(aig)
    }

    /// Creates an AIG from an .aag file using ASCII AIGER format.
    ///
    /// Warning, this uses a homemade "parser" which definitely does not support all AIG features
    /// (only the combinational bare minimum, no binary format, no latches).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("aag") => {
                let f =
                    File::open(path.as_ref()).map_err(|z| ParserError::IoError(z.to_string()))?;
                Aig::from_ascii(BufReader::new(f))
            }
            Some("aig") => {
                Err(ParserError::UnsupportedFeature("binary AIGER format".to_string()).into())
            }
            _ => Err(ParserError::IoError("invalid extension, expected .aag".to_string()).into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::NodeKind;

    fn header(m: u64) -> Header {
        Header {
            m,
            i: 0,
            o: 0,
            a: 0,
        }
    }

    fn parse(text: &str) -> Result<Aig> {
        Aig::from_ascii(BufReader::new(text.as_bytes()))
    }

    #[test]
    fn read_u64_test() {
        assert!(read_u64("").is_err());
        assert!(read_u64(" ").is_err());
        assert!(read_u64(" 2").is_err());
        assert!(read_u64("2 ").is_err());
        assert!(read_u64("-5").is_err());

        assert_eq!(read_u64("42").unwrap(), 42);
        assert_eq!(read_u64("0").unwrap(), 0);
    }

    #[test]
    fn header_try_from_test() {
        assert!(Header::try_from("").is_err());
        assert!(Header::try_from("aag 0 0 0 0").is_err());
        assert!(Header::try_from("aig 0 0 0 0 0").is_err());
        assert!(Header::try_from("aag 1 1 -1 1 1").is_err());
        assert!(matches!(
            Header::try_from("aag 3 1 1 1 1"),
            Err(ParserError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            Header::try_from("aag 3 1 0 1 1 1"),
            Err(ParserError::UnsupportedFeature(_))
        ));

        assert_eq!(Header::try_from("   aag 0 0 0 0 0 ").unwrap(), header(0));
        assert_eq!(
            Header::try_from("aag 7 18 0 2 1     \n").unwrap(),
            Header {
                m: 7,
                i: 18,
                o: 2,
                a: 1
            }
        );
    }

    #[test]
    fn read_input_test() {
        let h = header(21);
        assert!(read_input(&h, "").is_err());
        assert!(read_input(&h, " ").is_err());
        assert!(read_input(&h, "-5").is_err());
        assert!(read_input(&h, "2 14").is_err());
        assert!(read_input(&h, "4 z").is_err());
        assert!(read_input(&h, "3").is_err());
        assert!(read_input(&h, "0").is_err());
        assert!(read_input(&h, "44").is_err());

        assert_eq!(read_input(&h, " 2").unwrap(), 1);
        assert_eq!(read_input(&h, "2 \n").unwrap(), 1);
        assert_eq!(read_input(&h, "   42  ").unwrap(), 21);
    }

    #[test]
    fn read_output_test() {
        let h = header(21);
        assert!(read_output(&h, "").is_err());
        assert!(read_output(&h, " ").is_err());
        assert!(read_output(&h, "-5").is_err());
        assert!(read_output(&h, "2 14").is_err());
        assert!(read_output(&h, "4 z").is_err());

        assert_eq!(read_output(&h, " 2").unwrap(), AigEdge::new(1, false));
        assert_eq!(read_output(&h, "3 ").unwrap(), AigEdge::new(1, true));
        assert_eq!(read_output(&h, "   42  ").unwrap(), AigEdge::new(21, false));
        assert_eq!(read_output(&h, "1").unwrap(), AigEdge::new(0, true));
    }

    #[test]
    fn read_and_test() {
        let h = header(21);
        assert!(read_and(&h, "").is_err());
        assert!(read_and(&h, " ").is_err());
        assert!(read_and(&h, "-5").is_err());
        assert!(read_and(&h, "2 14").is_err());
        assert!(read_and(&h, "4 18 2 2").is_err());
        assert!(read_and(&h, "3 2 1").is_err());
        assert!(read_and(&h, "4 2 99").is_err());

        assert_eq!(
            read_and(&h, "2 6 7").unwrap(),
            (1, AigEdge::new(3, false), AigEdge::new(3, true))
        );
        assert_eq!(
            read_and(&h, "6 0 18").unwrap(),
            (3, AigEdge::new(0, false), AigEdge::new(9, false))
        );
        assert_eq!(
            read_and(&h, "   42   5 19   ").unwrap(),
            (21, AigEdge::new(2, true), AigEdge::new(9, true))
        );
    }

    #[test]
    fn read_symbol_test() {
        assert!(read_symbol("i0").is_err());
        assert!(read_symbol("x0 foo").is_err());
        assert!(read_symbol("ia foo").is_err());
        assert!(read_symbol("l0 foo").is_err());

        assert_eq!(
            read_symbol("i3 some name\n").unwrap(),
            (true, 3, "some name".to_string())
        );
        assert_eq!(read_symbol("o0 y").unwrap(), (false, 0, "y".to_string()));
    }

    #[test]
    fn forward_reference_test() {
        // 8 is used by 6 before being defined
        let aig = parse("aag 4 2 0 1 2\n2\n4\n6\n6 8 2\n8 3 5\nc\nwhatever\n").unwrap();
        assert!(aig.is_finalized().unwrap());
        assert_eq!(aig.and_count().unwrap(), 2);
        assert_eq!(
            aig.get_node(3).unwrap().get_fanins(),
            vec![AigEdge::new(4, false), AigEdge::new(1, false)]
        );
        assert_eq!(
            aig.get_node(4).unwrap().get_fanouts(),
            &[AigEdge::new(3, false)]
        );
        assert_eq!(aig.get_output_edges(), vec![AigEdge::new(3, false)]);
    }

    #[test]
    fn floating_literal_test() {
        // 10 is never defined
        let aig = parse("aag 5 1 0 1 1\n2\n6\n6 2 10\n").unwrap();
        assert!(!aig.is_finalized().unwrap());
        assert_eq!(aig.floating_gates(), vec![3]);
        assert!(matches!(
            aig.get_any_node(5).unwrap().get_kind(),
            NodeKind::Undefined
        ));
    }

    #[test]
    fn symbols_test() {
        let aig = parse("aag 3 2 0 1 1\n2\n4\n7\n6 2 4\ni1 b\no0 nand\ni0 a\n").unwrap();
        assert_eq!(aig.get_node(1).unwrap().get_name(), Some("a"));
        assert_eq!(aig.get_node(2).unwrap().get_name(), Some("b"));
        let output = aig.get_outputs()[0];
        assert_eq!(aig.get_node(output).unwrap().get_name(), Some("nand"));

        assert!(parse("aag 3 2 0 1 1\n2\n4\n7\n6 2 4\ni2 c\n").is_err());
    }

    #[test]
    fn invalid_files_test() {
        // Truncated
        assert!(parse("aag 3 2 0 1 1\n2\n4\n").is_err());
        // Latch
        assert!(matches!(
            parse("aag 1 0 1 0 0\n2 3\n"),
            Err(AigError::ParserError(ParserError::UnsupportedFeature(_)))
        ));
        // Same input twice, the input count would not match the header
        assert!(matches!(
            parse("aag 2 2 0 0 0\n2\n2\n"),
            Err(AigError::DuplicateId(1))
        ));
        assert!(parse("aag 2 2 0 0 0\n2\n4\n").is_ok());
        // Redefinition of an input as an and gate
        assert!(matches!(
            parse("aag 2 2 0 0 1\n2\n4\n4 2 2\n"),
            Err(AigError::DuplicateId(2))
        ));
        // Self loop
        assert!(parse("aag 2 1 0 0 1\n2\n4 4 2\n").is_err());
    }

    #[test]
    fn from_file_test() {
        let aig = Aig::from_file("assets/circuits/half-adder.aag").unwrap();
        assert_eq!(aig.get_inputs(), &[1, 2]);
        assert_eq!(aig.and_count().unwrap(), 3);
        assert_eq!(
            aig.get_output_edges(),
            vec![AigEdge::new(5, false), AigEdge::new(3, false)]
        );
        let names: Vec<Option<&str>> = aig
            .get_outputs()
            .iter()
            .map(|&id| aig.get_node(id).unwrap().get_name())
            .collect();
        assert_eq!(names, vec![Some("s"), Some("c")]);

        assert!(Aig::from_file("assets/circuits/strash.aig").is_err());
        assert!(Aig::from_file("assets/circuits/missing.aag").is_err());
        assert!(Aig::from_file("Cargo.toml").is_err());
    }
}
