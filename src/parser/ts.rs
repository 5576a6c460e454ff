//! Recursive-descent parser for TypeScript declarations.
//!
//! Classes, interfaces, type aliases, enums and namespaces are parsed into the
//! [`ast`](super::ast) tree. Every other statement, and every function or method
//! body, is skipped by bracket balancing.

use super::ast::*;
use super::jsdoc::JsDoc;
use super::lexer::{tokenize, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

type PResult<T> = std::result::Result<T, SyntaxError>;

/// Parses a complete source text.
pub fn parse_source(source: &str) -> PResult<SourceFile> {
    let tokens = tokenize(source).map_err(|e| SyntaxError {
        line: e.line,
        message: e.message,
    })?;
    let mut parser = TsParser {
        source,
        tokens,
        pos: 0,
    };
    let mut file = SourceFile::default();
    file.statements = parser.statements(false, &mut file.imports)?;
    Ok(file)
}

const DECLARATION_STARTS: [&str; 14] = [
    "export", "import", "class", "interface", "type", "enum", "namespace", "module", "declare",
    "abstract", "function", "const", "let", "var",
];

const MEMBER_MODIFIERS: [&str; 10] = [
    "public", "private", "protected", "static", "readonly", "abstract", "async", "declare",
    "override", "accessor",
];

struct TsParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> TsParser<'a> {
    // ---- token helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn nth(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn prev(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn prev_end(&self) -> usize {
        self.prev().map(|t| t.end).unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn nth_is_punct(&self, offset: usize, punct: &str) -> bool {
        matches!(&self.nth(offset).kind, TokenKind::Punct(p) if *p == punct)
    }

    fn is_ident(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(w) if w == word)
    }

    fn nth_ident(&self, offset: usize) -> Option<&str> {
        match &self.nth(offset).kind {
            TokenKind::Ident(w) => Some(w.as_str()),
            _ => None,
        }
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.is_ident(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", &self.source[token.start..token.end]),
        };
        SyntaxError {
            line: token.line,
            message: format!("expected {}, found {}", expected, found),
        }
    }

    fn expect_punct(&mut self, punct: &str) -> PResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", punct)))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn text_from(&self, start_pos: usize) -> String {
        let start = self.tokens[start_pos].start;
        let end = self.prev_end().max(start);
        self.source[start..end].to_string()
    }

    fn doc_here(&self) -> Option<JsDoc> {
        self.peek().doc.as_deref().map(JsDoc::parse)
    }

    fn on_new_line(&self) -> bool {
        self.prev().is_some_and(|p| self.peek().line > p.line)
    }

    // ---- statements ----

    fn statements(&mut self, in_block: bool, imports: &mut Vec<String>) -> PResult<Vec<Statement>> {
        let mut statements = Vec::new();

        loop {
            if self.at_eof() {
                if in_block {
                    return Err(self.error("'}'"));
                }
                break;
            }
            if in_block && self.is_punct("}") {
                break;
            }
            if self.eat_punct(";") {
                continue;
            }
            if !in_block && (self.is_punct("}") || self.is_punct(")") || self.is_punct("]")) {
                self.advance();
                continue;
            }

            let doc = self.doc_here();
            let line = self.peek().line;
            let mut decorators = self.decorators()?;
            let mut is_abstract = false;
            let mut consumed_modifier = false;
            loop {
                if self.is_ident("export") || self.is_ident("declare") {
                    self.advance();
                    consumed_modifier = true;
                } else if self.is_ident("default") && consumed_modifier {
                    self.advance();
                } else if self.is_ident("abstract") && self.nth_ident(1) == Some("class") {
                    self.advance();
                    is_abstract = true;
                } else {
                    break;
                }
            }
            decorators.extend(self.decorators()?);

            let keyword = self.nth_ident(0).map(str::to_string);
            match keyword.as_deref() {
                Some("import") if !self.nth_is_punct(1, "(") => {
                    if let Some(module) = self.import_statement() {
                        imports.push(module);
                    }
                }
                Some("class") => {
                    let class = self.class(decorators, doc, line, is_abstract)?;
                    statements.push(Statement::Class(class));
                }
                Some("interface") if self.nth_ident(1).is_some() => {
                    statements.push(Statement::Interface(self.interface(doc, line)?));
                }
                Some("type")
                    if self.nth_ident(1).is_some()
                        && (self.nth_is_punct(2, "=") || self.nth_is_punct(2, "<")) =>
                {
                    statements.push(Statement::TypeAlias(self.type_alias(doc, line)?));
                }
                Some("enum") => {
                    statements.push(Statement::Enum(self.enumeration(doc, line, false)?));
                }
                Some("const") if self.nth_ident(1) == Some("enum") => {
                    self.advance();
                    statements.push(Statement::Enum(self.enumeration(doc, line, true)?));
                }
                Some("namespace" | "module")
                    if matches!(
                        self.nth(1).kind,
                        TokenKind::Ident(_) | TokenKind::Str(_)
                    ) =>
                {
                    self.advance();
                    statements.push(Statement::Namespace(self.namespace(line, imports)?));
                }
                Some("global") if self.nth_is_punct(1, "{") => {
                    statements.push(Statement::Namespace(self.namespace(line, imports)?));
                }
                _ => self.skip_statement(),
            }
        }

        Ok(statements)
    }

    fn import_statement(&mut self) -> Option<String> {
        self.advance();
        loop {
            match &self.peek().kind {
                TokenKind::Str(module) => {
                    let module = module.clone();
                    self.advance();
                    self.eat_punct(";");
                    return Some(module);
                }
                TokenKind::Eof => return None,
                TokenKind::Punct(";") => {
                    self.advance();
                    return None;
                }
                TokenKind::Punct("{") => self.skip_balanced(),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skips one statement of any kind, stopping before a closing bracket that
    /// belongs to an enclosing block.
    fn skip_statement(&mut self) {
        let start = self.pos;
        let mut depth = 0usize;

        loop {
            let token = self.peek();
            match &token.kind {
                TokenKind::Eof => return,
                TokenKind::Punct(";") if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(closer @ (")" | "]" | "}")) => {
                    if depth == 0 {
                        if self.pos == start {
                            self.advance();
                        }
                        return;
                    }
                    depth -= 1;
                    if depth == 0 && *closer == "}" {
                        let closing_line = token.line;
                        self.advance();
                        let next = self.peek();
                        if next.line > closing_line && !continues_expression(&next.kind) {
                            return;
                        }
                        continue;
                    }
                }
                kind if depth == 0 && self.pos > start && self.on_new_line() => {
                    let starts_declaration = match kind {
                        TokenKind::Ident(word) => DECLARATION_STARTS.contains(&word.as_str()),
                        TokenKind::Punct("@") => true,
                        _ => false,
                    };
                    if starts_declaration && !self.prev_continues_expression() {
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn prev_continues_expression(&self) -> bool {
        match self.prev().map(|t| &t.kind) {
            Some(TokenKind::Punct(p)) => !matches!(*p, ")" | "]" | "}"),
            _ => false,
        }
    }

    /// Skips from an opening bracket to its matching closer, inclusive.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match &self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips a function body, reporting whether it returns a value.
    fn skip_body(&mut self) -> bool {
        let mut depth = 0usize;
        let mut returns_value = false;
        loop {
            match &self.peek().kind {
                TokenKind::Eof => return returns_value,
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return returns_value;
                    }
                }
                TokenKind::Ident(word) if word == "return" => {
                    let line = self.peek().line;
                    let next = self.nth(1);
                    let bare = matches!(next.kind, TokenKind::Punct(";" | "}") | TokenKind::Eof)
                        || next.line > line;
                    if !bare {
                        returns_value = true;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn decorators(&mut self) -> PResult<Vec<Decorator>> {
        let mut decorators = Vec::new();
        while self.is_punct("@") {
            let line = self.peek().line;
            self.advance();
            let mut name = self.expect_ident()?;
            while self.is_punct(".") {
                self.advance();
                name.push('.');
                name.push_str(&self.expect_ident()?);
            }

            let type_arguments = if self.is_punct("<") {
                self.type_arguments()?
            } else {
                Vec::new()
            };

            let mut arguments = Vec::new();
            if self.eat_punct("(") {
                while !self.is_punct(")") {
                    if self.at_eof() {
                        return Err(self.error("')'"));
                    }
                    arguments.push(self.expression(false)?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct(")")?;
            }

            decorators.push(Decorator {
                name,
                arguments,
                type_arguments,
                line,
            });
        }
        Ok(decorators)
    }

    // ---- declarations ----

    fn class(
        &mut self,
        decorators: Vec<Decorator>,
        doc: Option<JsDoc>,
        line: usize,
        is_abstract: bool,
    ) -> PResult<ClassDecl> {
        self.advance();
        let name = match &self.peek().kind {
            TokenKind::Ident(name) if name != "extends" && name != "implements" => {
                let name = name.clone();
                self.advance();
                name
            }
            _ => "default".to_string(),
        };
        let type_parameters = self.type_parameters()?;

        let mut extends = None;
        let mut implements = Vec::new();
        loop {
            if self.eat_ident("extends") {
                extends = Some(self.heritage_type()?);
            } else if self.eat_ident("implements") {
                loop {
                    implements.push(self.heritage_type()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
            } else {
                break;
            }
        }

        self.expect_punct("{")?;
        let mut members = Vec::new();
        while !self.is_punct("}") {
            if self.at_eof() {
                return Err(self.error("'}'"));
            }
            if self.eat_punct(";") {
                continue;
            }
            if let Some(member) = self.class_member()? {
                members.push(member);
            }
        }
        self.expect_punct("}")?;

        Ok(ClassDecl {
            name,
            decorators,
            type_parameters,
            extends,
            implements,
            members,
            doc,
            line,
            is_abstract,
        })
    }

    fn heritage_type(&mut self) -> PResult<TypeNode> {
        let start = self.pos;
        let node = self.primary_type()?;
        if self.is_punct("(") {
            // mixin call: `extends Mixin(Base)`
            self.skip_balanced();
            return Ok(TypeNode::Unsupported(self.text_from(start)));
        }
        Ok(node)
    }

    /// Whether the current identifier is a modifier rather than a member name.
    fn at_member_modifier(&self) -> bool {
        let Some(word) = self.nth_ident(0) else {
            return false;
        };
        if !MEMBER_MODIFIERS.contains(&word) {
            return false;
        }
        match &self.nth(1).kind {
            TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::Number(_) => {
                self.nth(1).line == self.peek().line
            }
            TokenKind::Punct(p) => matches!(*p, "[" | "#" | "*"),
            _ => false,
        }
    }

    fn class_member(&mut self) -> PResult<Option<ClassMember>> {
        let doc = self.doc_here();
        let line = self.peek().line;
        let decorators = self.decorators()?;

        let mut visibility = Visibility::Public;
        let mut is_static = false;
        let mut readonly = false;
        let mut is_async = false;
        while self.at_member_modifier() {
            if let TokenKind::Ident(word) = self.advance().kind {
                match word.as_str() {
                    "private" => visibility = Visibility::Private,
                    "protected" => visibility = Visibility::Protected,
                    "static" => is_static = true,
                    "readonly" => readonly = true,
                    "async" => is_async = true,
                    _ => {}
                }
            }
        }

        // static initialization block
        if is_static && self.is_punct("{") {
            self.skip_balanced();
            return Ok(None);
        }

        let is_accessor = matches!(self.nth_ident(0), Some("get" | "set"))
            && !matches!(
                self.nth(1).kind,
                TokenKind::Punct("(" | ":" | "?" | "=" | ";" | "<" | "!" | "}")
            );
        if is_accessor {
            self.advance();
        }
        self.eat_punct("*");

        if self.is_ident("constructor") && self.nth_is_punct(1, "(") {
            self.advance();
            let parameters = self.parameters()?;
            if self.is_punct("{") {
                self.skip_body();
            } else {
                self.eat_punct(";");
            }
            return Ok(Some(ClassMember::Constructor(parameters)));
        }

        if self.is_punct("[") {
            if let Some(index) = self.index_signature()? {
                self.eat_punct(";");
                return Ok(Some(ClassMember::IndexSignature(index)));
            }
            // computed member name
            self.skip_balanced();
            self.skip_member_rest();
            return Ok(None);
        }

        let mut private_name = false;
        if self.eat_punct("#") {
            private_name = true;
        }
        let name = self.property_name()?;
        if private_name {
            visibility = Visibility::Private;
        }

        let optional = self.eat_punct("?");
        self.eat_punct("!");

        if self.is_punct("(") || self.is_punct("<") {
            let type_parameters = self.type_parameters()?;
            let parameters = self.parameters()?;
            let return_type = if self.eat_punct(":") {
                Some(self.return_type()?)
            } else {
                None
            };
            let returns_value = if self.is_punct("{") {
                self.skip_body()
            } else {
                self.eat_punct(";");
                false
            };
            if is_accessor {
                return Ok(None);
            }
            return Ok(Some(ClassMember::Method(MethodDecl {
                name,
                decorators,
                type_parameters,
                parameters,
                return_type,
                is_static,
                is_async,
                visibility,
                returns_value,
                doc,
                line,
            })));
        }

        let type_node = if self.eat_punct(":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.eat_punct("=") {
            Some(self.expression(true)?)
        } else {
            None
        };
        self.eat_punct(";");

        Ok(Some(ClassMember::Property(PropertyDecl {
            name,
            decorators,
            type_node,
            optional,
            readonly,
            is_static,
            visibility,
            initializer,
            doc,
        })))
    }

    fn skip_member_rest(&mut self) {
        while !self.at_eof() && !self.is_punct(";") && !self.is_punct("}") {
            if self.is_punct("{") || self.is_punct("(") || self.is_punct("[") {
                let closes_member = self.is_punct("{");
                self.skip_balanced();
                if closes_member {
                    return;
                }
            } else {
                self.advance();
            }
        }
        self.eat_punct(";");
    }

    fn property_name(&mut self) -> PResult<String> {
        let name = match &self.peek().kind {
            TokenKind::Ident(name) | TokenKind::Str(name) | TokenKind::Number(name) => name.clone(),
            _ => return Err(self.error("member name")),
        };
        self.advance();
        Ok(name)
    }

    /// Return type annotation; type predicates (`x is T`) are unsupported.
    fn return_type(&mut self) -> PResult<TypeNode> {
        let start = self.pos;
        if self.is_ident("asserts") && self.nth_ident(1).is_some() {
            self.advance();
        }
        if self.nth_ident(0).is_some() && self.nth_ident(1) == Some("is") {
            self.advance();
            self.advance();
            self.parse_type()?;
            return Ok(TypeNode::Unsupported(self.text_from(start)));
        }
        self.parse_type()
    }

    fn parameters(&mut self) -> PResult<Vec<ParameterDecl>> {
        self.expect_punct("(")?;
        let mut parameters = Vec::new();

        while !self.is_punct(")") {
            if self.at_eof() {
                return Err(self.error("')'"));
            }
            let decorators = self.decorators()?;

            let mut property_visibility = None;
            let mut readonly = false;
            loop {
                match self.nth_ident(0) {
                    Some(word @ ("public" | "private" | "protected" | "readonly" | "override"))
                        if matches!(
                            self.nth(1).kind,
                            TokenKind::Ident(_) | TokenKind::Punct("{" | "[")
                        ) =>
                    {
                        match word {
                            "public" => property_visibility = Some(Visibility::Public),
                            "private" => property_visibility = Some(Visibility::Private),
                            "protected" => property_visibility = Some(Visibility::Protected),
                            "readonly" => {
                                readonly = true;
                                property_visibility.get_or_insert(Visibility::Public);
                            }
                            _ => {}
                        }
                        self.advance();
                    }
                    _ => break,
                }
            }

            let rest = self.eat_punct("...");
            let name = if self.is_punct("{") || self.is_punct("[") {
                self.skip_balanced();
                "__destructured".to_string()
            } else {
                self.expect_ident()?
            };
            let optional = self.eat_punct("?");
            let type_node = if self.eat_punct(":") {
                Some(self.parse_type()?)
            } else {
                None
            };
            let initializer = if self.eat_punct("=") {
                Some(self.expression(false)?)
            } else {
                None
            };

            if name != "this" {
                parameters.push(ParameterDecl {
                    name,
                    decorators,
                    type_node,
                    optional,
                    rest,
                    initializer,
                    property_visibility,
                    readonly,
                });
            }

            if !self.eat_punct(",") {
                break;
            }
        }

        self.expect_punct(")")?;
        Ok(parameters)
    }

    fn interface(&mut self, doc: Option<JsDoc>, line: usize) -> PResult<InterfaceDecl> {
        self.advance();
        let name = self.expect_ident()?;
        let type_parameters = self.type_parameters()?;

        let mut extends = Vec::new();
        if self.eat_ident("extends") {
            loop {
                extends.push(self.heritage_type()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }

        let members = match self.type_members()? {
            Some(members) => members,
            None => return Err(self.error("interface body without mapped members")),
        };

        Ok(InterfaceDecl {
            name,
            type_parameters,
            extends,
            members,
            doc,
            line,
        })
    }

    fn type_alias(&mut self, doc: Option<JsDoc>, line: usize) -> PResult<TypeAliasDecl> {
        self.advance();
        let name = self.expect_ident()?;
        let type_parameters = self.type_parameters()?;
        self.expect_punct("=")?;
        let type_node = self.parse_type()?;
        self.eat_punct(";");

        Ok(TypeAliasDecl {
            name,
            type_parameters,
            type_node,
            doc,
            line,
        })
    }

    fn enumeration(&mut self, doc: Option<JsDoc>, line: usize, is_const: bool) -> PResult<EnumDecl> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect_punct("{")?;

        let mut members = Vec::new();
        while !self.is_punct("}") {
            let member_doc = self.doc_here();
            let member_name = self.property_name()?;
            let initializer = if self.eat_punct("=") {
                Some(self.expression(false)?)
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                initializer,
                doc: member_doc,
            });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;

        Ok(EnumDecl {
            name,
            members,
            is_const,
            doc,
            line,
        })
    }

    fn namespace(&mut self, line: usize, imports: &mut Vec<String>) -> PResult<NamespaceDecl> {
        let mut name = match self.advance().kind {
            TokenKind::Ident(name) | TokenKind::Str(name) => name,
            _ => return Err(self.error("namespace name")),
        };
        while self.eat_punct(".") {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }

        if !self.eat_punct("{") {
            // `declare module 'x';`
            self.eat_punct(";");
            return Ok(NamespaceDecl {
                name,
                statements: Vec::new(),
                line,
            });
        }
        let statements = self.statements(true, imports)?;
        self.expect_punct("}")?;

        Ok(NamespaceDecl {
            name,
            statements,
            line,
        })
    }

    // ---- types ----

    fn type_parameters(&mut self) -> PResult<Vec<TypeParameter>> {
        let mut parameters = Vec::new();
        if !self.eat_punct("<") {
            return Ok(parameters);
        }
        while !self.is_punct(">") {
            while matches!(self.nth_ident(0), Some("const" | "in" | "out"))
                && self.nth_ident(1).is_some()
            {
                self.advance();
            }
            let name = self.expect_ident()?;
            let constraint = if self.eat_ident("extends") {
                Some(self.parse_type()?)
            } else {
                None
            };
            let default = if self.eat_punct("=") {
                Some(self.parse_type()?)
            } else {
                None
            };
            parameters.push(TypeParameter {
                name,
                constraint,
                default,
            });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(">")?;
        Ok(parameters)
    }

    fn type_arguments(&mut self) -> PResult<Vec<TypeNode>> {
        self.expect_punct("<")?;
        let mut arguments = Vec::new();
        while !self.is_punct(">") {
            arguments.push(self.parse_type()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(">")?;
        Ok(arguments)
    }

    pub(crate) fn parse_type(&mut self) -> PResult<TypeNode> {
        let start = self.pos;

        if self.is_punct("<") || self.is_ident("new") || self.is_ident("abstract") {
            // generic or constructor function type
            while !self.is_punct("(") && !self.at_eof() {
                if self.is_punct("<") {
                    self.type_parameters()?;
                } else {
                    self.advance();
                }
            }
            return self.function_type(start);
        }
        if self.is_punct("(") && self.paren_starts_function_type() {
            return self.function_type(start);
        }

        let node = self.union_type()?;

        if self.is_ident("extends") && !self.on_new_line() {
            // conditional type
            self.advance();
            self.union_type()?;
            self.expect_punct("?")?;
            self.parse_type()?;
            self.expect_punct(":")?;
            self.parse_type()?;
            return Ok(TypeNode::Unsupported(self.text_from(start)));
        }
        Ok(node)
    }

    fn function_type(&mut self, start: usize) -> PResult<TypeNode> {
        self.skip_balanced();
        self.expect_punct("=>")?;
        self.return_type()?;
        Ok(TypeNode::Unsupported(self.text_from(start)))
    }

    /// Looks past a parenthesized group for `=>`.
    fn paren_starts_function_type(&self) -> bool {
        let mut depth = 0usize;
        let mut index = self.pos;
        while let Some(token) = self.tokens.get(index) {
            match &token.kind {
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(index + 1).map(|t| &t.kind),
                            Some(TokenKind::Punct("=>"))
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            index += 1;
        }
        false
    }

    fn union_type(&mut self) -> PResult<TypeNode> {
        self.eat_punct("|");
        let mut members = vec![self.intersection_type()?];
        while self.eat_punct("|") {
            members.push(self.intersection_type()?);
        }
        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeNode::Union(members)
        })
    }

    fn intersection_type(&mut self) -> PResult<TypeNode> {
        self.eat_punct("&");
        let mut members = vec![self.postfix_type()?];
        while self.eat_punct("&") {
            members.push(self.postfix_type()?);
        }
        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeNode::Intersection(members)
        })
    }

    fn postfix_type(&mut self) -> PResult<TypeNode> {
        let start = self.pos;
        let mut node = self.primary_type()?;

        while self.is_punct("[") && !self.on_new_line() {
            self.advance();
            if self.eat_punct("]") {
                node = TypeNode::Array(Box::new(node));
            } else {
                // indexed access: `T['key']`
                self.parse_type()?;
                self.expect_punct("]")?;
                node = TypeNode::Unsupported(self.text_from(start));
            }
        }
        Ok(node)
    }

    fn primary_type(&mut self) -> PResult<TypeNode> {
        let start = self.pos;
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            TokenKind::Punct("{") => match self.type_members()? {
                Some(members) => Ok(TypeNode::TypeLiteral(members)),
                None => Ok(TypeNode::Unsupported(self.text_from(start))),
            },
            TokenKind::Punct("[") => self.tuple_type(),
            TokenKind::Punct("-") => {
                self.advance();
                match self.advance().kind {
                    TokenKind::Number(n) => Ok(TypeNode::Literal(LiteralType::Number(format!(
                        "-{}",
                        n
                    )))),
                    _ => Err(self.error("numeric literal")),
                }
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(TypeNode::Literal(LiteralType::String(value)))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(TypeNode::Literal(LiteralType::Number(value)))
            }
            TokenKind::Template(_) => {
                self.advance();
                Ok(TypeNode::Unsupported(self.text_from(start)))
            }
            TokenKind::Ident(word) => match word.as_str() {
                "true" | "false" => {
                    self.advance();
                    Ok(TypeNode::Literal(LiteralType::Boolean(word == "true")))
                }
                "keyof" | "unique" | "infer" => {
                    self.advance();
                    self.postfix_type()?;
                    Ok(TypeNode::Unsupported(self.text_from(start)))
                }
                "typeof" => {
                    self.advance();
                    self.expect_ident()?;
                    while self.eat_punct(".") {
                        self.expect_ident()?;
                    }
                    Ok(TypeNode::Unsupported(self.text_from(start)))
                }
                "readonly"
                    if self.nth(1).line == token.line
                        && matches!(
                            self.nth(1).kind,
                            TokenKind::Ident(_) | TokenKind::Punct("(" | "[")
                        ) =>
                {
                    self.advance();
                    self.postfix_type()
                }
                "this" => {
                    self.advance();
                    Ok(TypeNode::Unsupported("this".to_string()))
                }
                _ => {
                    if let Some(keyword) = Keyword::from_ident(&word) {
                        if !self.nth_is_punct(1, ".") {
                            self.advance();
                            return Ok(TypeNode::Keyword(keyword));
                        }
                    }
                    self.advance();
                    let mut name = word.clone();
                    while self.is_punct(".") && self.nth_ident(1).is_some() {
                        self.advance();
                        name.push('.');
                        name.push_str(&self.expect_ident()?);
                    }
                    let type_arguments = if self.is_punct("<") && !self.on_new_line() {
                        self.type_arguments()?
                    } else {
                        Vec::new()
                    };
                    Ok(TypeNode::Reference {
                        name,
                        type_arguments,
                    })
                }
            },
            _ => Err(self.error("type")),
        }
    }

    fn tuple_type(&mut self) -> PResult<TypeNode> {
        self.expect_punct("[")?;
        let mut elements = Vec::new();
        while !self.is_punct("]") {
            self.eat_punct("...");
            // named member: `[id: string, name?: string]`
            if self.nth_ident(0).is_some()
                && (self.nth_is_punct(1, ":") || (self.nth_is_punct(1, "?") && self.nth_is_punct(2, ":")))
            {
                self.advance();
                self.eat_punct("?");
                self.advance();
            }
            elements.push(self.parse_type()?);
            self.eat_punct("?");
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("]")?;
        Ok(TypeNode::Tuple(elements))
    }

    /// Index signature at the current `[`, or `None` for a computed member name.
    fn index_signature(&mut self) -> PResult<Option<IndexSignature>> {
        if !(self.nth_ident(1).is_some() && self.nth_is_punct(2, ":")) {
            return Ok(None);
        }
        self.expect_punct("[")?;
        let key_name = self.expect_ident()?;
        self.expect_punct(":")?;
        let key_type = self.parse_type()?;
        self.expect_punct("]")?;
        self.eat_punct("?");
        self.expect_punct(":")?;
        let value_type = self.parse_type()?;
        Ok(Some(IndexSignature {
            key_name,
            key_type,
            value_type,
        }))
    }

    /// Parses `{ ... }` members; returns `None` (after skipping) for mapped types.
    fn type_members(&mut self) -> PResult<Option<Vec<TypeMember>>> {
        self.expect_punct("{")?;
        let mut members = Vec::new();

        while !self.is_punct("}") {
            if self.at_eof() {
                return Err(self.error("'}'"));
            }
            if self.eat_punct(";") || self.eat_punct(",") {
                continue;
            }

            let doc = self.doc_here();
            let mut readonly = false;
            if self.is_ident("readonly")
                && !matches!(self.nth(1).kind, TokenKind::Punct(":" | "?" | "(" | ";" | ","))
            {
                self.advance();
                readonly = true;
            }
            // `-readonly [K in T]` style modifiers
            if (self.is_punct("-") || self.is_punct("+")) && self.nth_ident(1) == Some("readonly") {
                self.advance();
                self.advance();
            }

            if self.is_punct("[") {
                if self.nth_ident(1).is_some() && self.nth_ident(2) == Some("in") {
                    self.skip_to_closing_brace();
                    return Ok(None);
                }
                if let Some(index) = self.index_signature()? {
                    members.push(TypeMember::Index(index));
                } else {
                    self.skip_balanced();
                    self.skip_member_signature_rest()?;
                }
                continue;
            }

            if self.is_ident("new") && matches!(self.nth(1).kind, TokenKind::Punct("(" | "<")) {
                self.advance();
            }
            if self.is_punct("(") || self.is_punct("<") {
                // call or construct signature
                self.skip_member_signature_rest()?;
                continue;
            }

            let name = self.property_name()?;
            let optional = self.eat_punct("?");

            if self.is_punct("(") || self.is_punct("<") {
                self.skip_member_signature_rest()?;
                members.push(TypeMember::Method(name));
                continue;
            }

            let type_node = if self.eat_punct(":") {
                Some(self.parse_type()?)
            } else {
                None
            };
            members.push(TypeMember::Property(PropertySignature {
                name,
                type_node,
                optional,
                readonly,
                doc,
            }));
        }

        self.expect_punct("}")?;
        Ok(Some(members))
    }

    fn skip_member_signature_rest(&mut self) -> PResult<()> {
        if self.is_punct("<") {
            self.type_parameters()?;
        }
        if self.is_punct("(") {
            self.skip_balanced();
        }
        if self.eat_punct(":") {
            self.return_type()?;
        }
        Ok(())
    }

    /// Skips to the `}` closing the type literal whose `{` was already consumed.
    fn skip_to_closing_brace(&mut self) {
        let mut depth = 1usize;
        while !self.at_eof() {
            match &self.peek().kind {
                TokenKind::Punct("{") => depth += 1,
                TokenKind::Punct("}") => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ---- expressions ----

    /// Parses a literal expression, falling back to raw source text.
    ///
    /// With `newline_terminates`, a new line starting with an identifier ends the
    /// expression (class property initializers without semicolons).
    fn expression(&mut self, newline_terminates: bool) -> PResult<Expr> {
        let start = self.pos;

        if let Some(expr) = self.simple_expression()? {
            if self.is_ident("as") || self.is_ident("satisfies") {
                self.advance();
                self.parse_type()?;
            }
            if self.expression_ends(newline_terminates) {
                return Ok(expr);
            }
        }

        self.pos = start;
        Ok(Expr::Raw(self.raw_expression(newline_terminates)))
    }

    fn expression_ends(&self, newline_terminates: bool) -> bool {
        match &self.peek().kind {
            TokenKind::Eof => true,
            TokenKind::Punct(p) => {
                matches!(*p, "," | ")" | "]" | "}" | ";")
                    || (newline_terminates && self.on_new_line() && matches!(*p, "@" | "#"))
            }
            TokenKind::Ident(_) | TokenKind::Str(_) => newline_terminates && self.on_new_line(),
            _ => false,
        }
    }

    fn simple_expression(&mut self) -> PResult<Option<Expr>> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::Str(value) => {
                self.advance();
                Expr::String(value)
            }
            TokenKind::Template(raw) if !raw.contains("${") => {
                self.advance();
                Expr::String(raw)
            }
            TokenKind::Number(value) => {
                self.advance();
                Expr::Number(value)
            }
            TokenKind::Punct(sign @ ("-" | "+")) => match &self.nth(1).kind {
                TokenKind::Number(value) => {
                    let value = if sign == "-" {
                        format!("-{}", value)
                    } else {
                        value.clone()
                    };
                    self.advance();
                    self.advance();
                    Expr::Number(value)
                }
                _ => return Ok(None),
            },
            TokenKind::Ident(word) => {
                self.advance();
                match word.as_str() {
                    "true" => Expr::Bool(true),
                    "false" => Expr::Bool(false),
                    "null" => Expr::Null,
                    "undefined" => Expr::Undefined,
                    _ => {
                        let mut path = word;
                        while self.is_punct(".") && self.nth_ident(1).is_some() {
                            self.advance();
                            path.push('.');
                            path.push_str(&self.expect_ident()?);
                        }
                        Expr::Path(path)
                    }
                }
            }
            TokenKind::Punct("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.is_punct("]") {
                    if self.at_eof() || self.is_punct("...") {
                        return Ok(None);
                    }
                    items.push(self.expression(false)?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                if !self.eat_punct("]") {
                    return Ok(None);
                }
                Expr::Array(items)
            }
            TokenKind::Punct("{") => {
                self.advance();
                let mut entries = Vec::new();
                while !self.is_punct("}") {
                    let key = match &self.peek().kind {
                        TokenKind::Ident(k) | TokenKind::Str(k) | TokenKind::Number(k) => k.clone(),
                        _ => return Ok(None),
                    };
                    self.advance();
                    let value = if self.eat_punct(":") {
                        self.expression(false)?
                    } else if self.is_punct(",") || self.is_punct("}") {
                        Expr::Path(key.clone())
                    } else {
                        return Ok(None);
                    };
                    entries.push((key, value));
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                if !self.eat_punct("}") {
                    return Ok(None);
                }
                Expr::Object(entries)
            }
            _ => return Ok(None),
        };
        Ok(Some(expr))
    }

    fn raw_expression(&mut self, newline_terminates: bool) -> String {
        let start = self.pos;
        let mut depth = 0usize;

        loop {
            let token = self.peek();
            if token.kind == TokenKind::Eof {
                break;
            }
            if depth == 0 {
                if matches!(token.kind, TokenKind::Punct("," | ")" | "]" | "}" | ";")) {
                    break;
                }
                if newline_terminates
                    && self.pos > start
                    && self.on_new_line()
                    && matches!(
                        token.kind,
                        TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::Punct("@" | "#")
                    )
                    && !self.prev_continues_expression()
                {
                    break;
                }
            }
            match token.kind {
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        if self.pos == start {
            String::new()
        } else {
            self.text_from(start)
        }
    }
}

fn continues_expression(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Punct(p) => !matches!(*p, "@" | "#" | ";" | "}"),
        TokenKind::Ident(word) => matches!(word.as_str(), "as" | "satisfies"),
        _ => false,
    }
}
