//! Entries the demo stores: a handful of Semantic Kernel GitHub URLs with a
//! short description each, and two plain ids for trying unmapped keys.

const GITHUB_FILES: [(&str, &str); 7] = [
    (
        "https://github.com/microsoft/semantic-kernel/blob/main/README.md",
        "README: Installation, getting started, and how to contribute",
    ),
    (
        "https://github.com/microsoft/semantic-kernel/blob/main/samples/notebooks/dotnet/02-running-prompts-from-file.ipynb",
        "Jupyter notebook describing how to pass prompts from a file to a semantic skill or function",
    ),
    (
        "https://github.com/microsoft/semantic-kernel/blob/main/samples/notebooks/dotnet/00-getting-started.ipynb",
        "Jupyter notebook describing how to get started with the Semantic Kernel",
    ),
    (
        "https://github.com/microsoft/semantic-kernel/tree/main/samples/skills/ChatSkill/ChatGPT",
        "Sample demonstrating how to create a chat skill interfacing with ChatGPT",
    ),
    (
        "https://github.com/microsoft/semantic-kernel/blob/main/dotnet/src/SemanticKernel/Memory/VolatileMemoryStore.cs",
        "C# class that defines a volatile embedding store",
    ),
    (
        "https://github.com/microsoft/semantic-kernel/blob/main/samples/dotnet/KernelHttpServer/README.md",
        "README: How to set up a Semantic Kernel Service API using Azure Function Runtime v4",
    ),
    (
        "https://github.com/microsoft/semantic-kernel/blob/main/samples/apps/chat-summary-webapp-react/README.md",
        "README: README associated with a sample chat summary react-based webapp",
    ),
];

/// Natural id of the first GitHub entry, looked up by the demo.
pub const README_URL: &str = GITHUB_FILES[0].0;

/// GitHub URL → description, in a stable order.
pub fn sample_data() -> Vec<(String, String)> { owned(&GITHUB_FILES) }

pub fn sample_data_with_no_mapping() -> Vec<(String, String)> {
    owned(&[("id_1", "This is test 1"), ("id_2", "This is test 2")])
}

fn owned(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
