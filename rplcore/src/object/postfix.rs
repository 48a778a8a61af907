//! Walking expressions stored in postfix order.

use std::ops::Range;

use crate::{
    command::Command,
    error::{RplError, RplResult},
    object::Object,
};

fn operands_of(item: &Object) -> usize {
    match item {
        Object::Command(cmd) => cmd.operands(),
        _ => 0,
    }
}

/// Fold postfix items bottom-up. Returns the values left on the fold stack,
/// which is a single value for a well-formed expression.
pub fn fold<T>(
    items: &[Object],
    mut leaf: impl FnMut(&Object) -> RplResult<T>,
    mut node: impl FnMut(Command, Vec<T>) -> RplResult<T>,
) -> RplResult<Vec<T>> {
    let mut stack: Vec<T> = Vec::new();
    for item in items {
        match item {
            Object::Command(cmd) if cmd.operands() > 0 => {
                let n = cmd.operands();
                if stack.len() < n {
                    return Err(RplError::InvalidObject("operator is missing operands"));
                }
                let args = stack.split_off(stack.len() - n);
                stack.push(node(*cmd, args)?);
            }
            other => stack.push(leaf(other)?),
        }
    }
    Ok(stack)
}

/// Index ranges of the independent sub-expressions in `items`.
pub fn ranges(items: &[Object]) -> RplResult<Vec<Range<usize>>> {
    let mut stack: Vec<Range<usize>> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let n = operands_of(item);
        if stack.len() < n {
            return Err(RplError::InvalidObject("operator is missing operands"));
        }
        let start = if n == 0 {
            index
        } else {
            stack[stack.len() - n].start
        };
        stack.truncate(stack.len() - n);
        stack.push(start..index + 1);
    }
    Ok(stack)
}

/// Split a single-rooted expression into its top operator and operands.
pub fn split_last(items: &[Object]) -> Option<(Command, Vec<&[Object]>)> {
    let (Object::Command(cmd), body) = items.split_last()? else {
        return None;
    };
    let ranges = ranges(body).ok()?;
    if cmd.operands() == 0 || ranges.len() != cmd.operands() {
        return None;
    }
    Some((*cmd, ranges.into_iter().map(|r| &body[r]).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Object {
        Object::symbol("X")
    }

    #[test]
    fn fold_counts_nodes() {
        // X 1 + 2 *
        let items = vec![
            x(),
            Object::integer(1),
            Command::Add.into(),
            Object::integer(2),
            Command::Mul.into(),
        ];
        let result = fold(&items, |_| Ok(1usize), |_, args| Ok(1 + args.iter().sum::<usize>()));
        assert_eq!(result.unwrap(), vec![5]);
    }

    #[test]
    fn split_equation() {
        let items = vec![x(), Object::integer(3), Command::Equation.into()];
        let (cmd, parts) = split_last(&items).unwrap();
        assert_eq!(cmd, Command::Equation);
        assert_eq!(parts, vec![&items[0..1], &items[1..2]]);
    }

    #[test]
    fn malformed_is_reported() {
        let items = vec![x(), Command::Add.into()];
        assert!(fold(&items, |_| Ok(()), |_, _| Ok(())).is_err());
        assert!(ranges(&items).is_err());
        assert!(split_last(&items).is_none());
    }
}
