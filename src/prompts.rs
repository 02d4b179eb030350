/// Preset prompts offered in the UI alongside free-form entry.
pub const PRESET_PROMPTS: &[&str] = &[
    "Describe this image in detail",
    "What objects can you identify in this image?",
    "What is the main subject of this image?",
    "Analyze the colors and composition of this image",
    "Is there any text in this image? If so, what does it say?",
    "What is the mood or atmosphere of this image?",
    "Are there any people in this image? Describe them.",
    "What location or setting is depicted in this image?",
    "Analyze this sequence diagram - show all participants, messages, and interactions",
    "Extract all text and labels from this diagram",
    "Explain the flow and logic shown in this technical diagram",
];

/// Focused prompt used instead of the user's when the upload looks like a
/// sequence diagram. Generic prompts tend to get back "a diagram with boxes
/// and arrows"; this one asks for the labels and message flow.
pub const SEQUENCE_DIAGRAM_PROMPT: &str = "\
This is a UML sequence diagram. Please analyze it in detail and provide:
1. All participants/actors in the diagram
2. The sequence of messages between participants
3. Any conditions, loops, or combined fragments
4. The overall flow and purpose of the interaction
5. Any return messages or synchronous/asynchronous calls
Please be very specific about the text labels and message content.";

const FILE_NAME_KEYWORDS: &[&str] = &[
    "sequence",
    "seq",
    "interaction",
    "collaboration",
    "message flow",
    "uml",
    "system flow",
    "process flow",
];

const PROMPT_KEYWORDS: &[&str] = &[
    "sequence",
    "lifeline",
    "message",
    "participant",
    "actor",
    "interaction",
    "uml",
    "diagram",
];

/// True when the file name or the prompt suggests a sequence diagram.
/// String matching only - the image itself is never inspected.
pub fn looks_like_sequence_diagram(prompt: &str, file_name: &str) -> bool {
    let file_name = file_name.to_lowercase();
    if FILE_NAME_KEYWORDS.iter().any(|kw| file_name.contains(kw)) {
        return true;
    }
    let prompt = prompt.to_lowercase();
    PROMPT_KEYWORDS.iter().any(|kw| prompt.contains(kw))
}

/// The prompt actually sent to the model: the user's, unless the upload
/// looks like a sequence diagram.
pub fn effective_prompt<'a>(prompt: &'a str, file_name: &str) -> &'a str {
    if looks_like_sequence_diagram(prompt, file_name) {
        SEQUENCE_DIAGRAM_PROMPT
    } else {
        prompt
    }
}
