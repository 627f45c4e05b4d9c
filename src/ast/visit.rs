//! Traversal of ASTs.
//!
//! Every method defaults to the matching `walk_*` function, which visits
//! the node's children. Implementors override the capabilities they care
//! about and call back into `walk_*` to keep descending.

use super::*;

pub trait Visit<'ast> {
    fn visit_source(&mut self, i: &'ast SourceFile) {
        walk_source(self, i)
    }

    fn visit_decl(&mut self, i: &'ast Spanned<Decl>) {
        walk_decl(self, i)
    }

    fn visit_function(&mut self, i: &'ast Function) {
        walk_function(self, i)
    }

    fn visit_segment(&mut self, i: &'ast DataSegment) {
        walk_segment(self, i)
    }

    fn visit_block(&mut self, i: &'ast Block) {
        walk_block(self, i)
    }

    fn visit_stmt(&mut self, i: &'ast Spanned<Stmt>) {
        walk_stmt(self, i)
    }

    fn visit_expr(&mut self, i: &'ast Spanned<Expr>) {
        walk_expr(self, i)
    }

    fn visit_pattern(&mut self, i: &'ast Spanned<Pattern>) {
        walk_pattern(self, i)
    }
}

pub fn walk_source<'ast, V>(v: &mut V, i: &'ast SourceFile)
where V: ?Sized + Visit<'ast> {
    i.items.iter().for_each(|decl| v.visit_decl(decl));
}

pub fn walk_decl<'ast, V>(v: &mut V, i: &'ast Spanned<Decl>)
where V: ?Sized + Visit<'ast> {
    match &i.node {
        Decl::Function(func) => v.visit_function(func),
        Decl::Def(def) => v.visit_expr(&def.value),
        Decl::Global(global) => v.visit_expr(&global.value),
        Decl::Memory(memory) => {
            memory.segments.iter().for_each(|seg| v.visit_segment(seg));
        }
        Decl::Import(_) | Decl::Export(_) | Decl::Type(_) => {}
    }
}

pub fn walk_function<'ast, V>(v: &mut V, i: &'ast Function)
where V: ?Sized + Visit<'ast> {
    v.visit_block(&i.body);
}

pub fn walk_segment<'ast, V>(v: &mut V, i: &'ast DataSegment)
where V: ?Sized + Visit<'ast> {
    v.visit_expr(&i.offset);
    v.visit_expr(&i.value);
}

pub fn walk_block<'ast, V>(v: &mut V, i: &'ast Block)
where V: ?Sized + Visit<'ast> {
    i.stmts.iter().for_each(|stmt| v.visit_stmt(stmt));
    if let Some(value) = &i.value {
        v.visit_expr(value);
    }
}

pub fn walk_stmt<'ast, V>(v: &mut V, i: &'ast Spanned<Stmt>)
where V: ?Sized + Visit<'ast> {
    match &i.node {
        Stmt::Let { pattern, value, .. } => {
            v.visit_pattern(pattern);
            v.visit_expr(value);
        }
        Stmt::Assign { target, value } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Stmt::Expr(expr) => v.visit_expr(expr),
        Stmt::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
    }
}

pub fn walk_expr<'ast, V>(v: &mut V, i: &'ast Spanned<Expr>)
where V: ?Sized + Visit<'ast> {
    match &i.node {
        Expr::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::Cast { expr, .. } | Expr::Annotation { expr, .. } => v.visit_expr(expr),
        Expr::Call { callee, args } => {
            v.visit_expr(callee);
            args.iter().for_each(|arg| v.visit_expr(arg));
        }
        Expr::Member { object, .. } => v.visit_expr(object),
        Expr::Index { object, index } => {
            v.visit_expr(object);
            v.visit_expr(index);
        }
        Expr::Identifier(_) | Expr::Literal(_) => {}
        Expr::Array(elements) => elements.iter().for_each(|e| v.visit_expr(e)),
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            v.visit_expr(condition);
            v.visit_block(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_block(else_branch);
            }
        }
        Expr::Match { scrutinee, arms } => {
            v.visit_expr(scrutinee);
            for arm in arms {
                if let MatchPattern::Value(pattern) = &arm.pattern {
                    v.visit_expr(pattern);
                }
                v.visit_expr(&arm.body);
            }
        }
        Expr::Tuple(fields) => fields.iter().for_each(|f| v.visit_expr(&f.value)),
        Expr::Group(inner) => v.visit_expr(inner),
    }
}

pub fn walk_pattern<'ast, V>(v: &mut V, i: &'ast Spanned<Pattern>)
where V: ?Sized + Visit<'ast> {
    if let Pattern::Tuple(items) = &i.node {
        items.iter().for_each(|p| v.visit_pattern(p));
    }
}
