//! Text rendering of dispatch inputs and output.

use hc_common::HostBuffer;

/// `[a b c]`, with floats at two decimal places.
fn values(buffer: &HostBuffer) -> String {
    let items: Vec<String> = match buffer {
        HostBuffer::U32(v) => v.iter().map(|x| x.to_string()).collect(),
        HostBuffer::F32(v) => v.iter().map(|x| format!("{x:.2}")).collect(),
    };
    format!("[{}]", items.join(" "))
}

/// One `input: [...]` line (numbered `input1`, `input2`, .. when there is
/// more than one input) followed by `output: [...]`.
pub fn render(inputs: &[HostBuffer], output: &HostBuffer) -> String {
    let mut lines = Vec::with_capacity(inputs.len() + 1);
    if let [input] = inputs {
        lines.push(format!("input: {}", values(input)));
    } else {
        for (i, input) in inputs.iter().enumerate() {
            lines.push(format!("input{}: {}", i + 1, values(input)));
        }
    }
    lines.push(format!("output: {}", values(output)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_integer_buffer() {
        let input = HostBuffer::U32(vec![0, 1, 2, 3]);
        let text = render(std::slice::from_ref(&input), &input);
        assert_eq!(text, "input: [0 1 2 3]\noutput: [0 1 2 3]");
    }

    #[test]
    fn floats_use_two_decimals_and_numbered_inputs() {
        let inputs = [HostBuffer::F32(vec![1.0, 2.5]), HostBuffer::F32(vec![3.333, 4.0])];
        let output = HostBuffer::F32(vec![4.333, 6.5]);
        assert_eq!(
            render(&inputs, &output),
            "input1: [1.00 2.50]\ninput2: [3.33 4.00]\noutput: [4.33 6.50]"
        );
    }

    #[test]
    fn empty_buffer_renders_brackets() {
        assert_eq!(values(&HostBuffer::U32(Vec::new())), "[]");
    }
}
